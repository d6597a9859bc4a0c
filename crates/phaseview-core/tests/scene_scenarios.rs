//! Scene model scenarios through the public API

mod common;

use common::figure_f;
use phaseview_core::{
    Coords, DataSpec, DisplayTarget, EntityKind, LayerSelection, LayerSpec, PositionCode, SceneError, SubplotSpec,
};
use phaseview_geom::Point2;

#[test]
fn test_single_entry_resolves_to_first_listing_subplot() {
    let mut scene = figure_f();
    let fig = scene.figure("F").unwrap();
    assert_eq!(fig.layer("L").unwrap().len(), 1);
    assert_eq!(fig.resolve_subplot("L"), Some(PositionCode::new(1, 1).unwrap()));

    scene
        .arrange_figure(
            Some("F"),
            2,
            2,
            vec![
                SubplotSpec::new("11", ["x", "y"], LayerSelection::named(["other"])),
                SubplotSpec::new("21", ["x", "y"], LayerSelection::named(["L"])),
                SubplotSpec::new("12", ["x", "y"], LayerSelection::named(["L"])),
            ],
        )
        .unwrap();
    // arrangement order, not grid order
    assert_eq!(
        scene.figure("F").unwrap().resolve_subplot("L"),
        Some(PositionCode::new(2, 1).unwrap())
    );
}

#[test]
fn test_adding_entries_counts_exactly() {
    let mut scene = figure_f();
    for i in 0..4 {
        let coords = Coords::new(vec![i as f64], vec![0.0]).unwrap();
        scene
            .add_data(Some("F"), Some("L"), DataSpec::points(coords).display(i % 2 == 0))
            .unwrap();
    }
    let layer = scene.layer(Some("F"), "L").unwrap();
    assert_eq!(layer.len(), 5);
    let shown: Vec<bool> = layer.entries()[1..].iter().map(|e| e.display).collect();
    assert_eq!(shown, vec![true, false, true, false]);
}

#[test]
fn test_duplicate_name_needs_force() {
    let mut scene = figure_f();
    let coords = Coords::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
    scene
        .add_data(None, Some("L"), DataSpec::points(coords.clone()).name("d"))
        .unwrap();

    let err = scene
        .add_data(None, Some("L"), DataSpec::points(Coords::point(Point2::new(5.0, 5.0))).name("d"))
        .unwrap_err();
    assert_eq!(
        err,
        SceneError::DuplicateName {
            kind: EntityKind::Entry,
            name: "d".to_string()
        }
    );
    assert_eq!(scene.entry(None, "L", "d").unwrap().payload.coords(), Some(&coords));

    scene
        .add_data(
            None,
            Some("L"),
            DataSpec::points(Coords::point(Point2::new(5.0, 5.0))).name("d").force(true),
        )
        .unwrap();
    assert_eq!(scene.layer(None, "L").unwrap().len(), 2);
    assert_eq!(scene.entry(None, "L", "d").unwrap().payload.coords().unwrap().x(), &[5.0]);
}

#[test]
fn test_mismatched_coordinates_rejected() {
    let err = Coords::new(vec![0.0, 1.0, 2.0], vec![0.0]).unwrap_err();
    assert!(matches!(err, SceneError::InvalidShape { .. }));
    assert!(matches!(
        Coords::from_columns(vec![vec![0.0]; 4]),
        Err(SceneError::InvalidShape { .. })
    ));
}

#[test]
fn test_toggle_twice_restores_visibility() {
    let mut scene = figure_f();
    let name = scene.layer(None, "L").unwrap().entries()[0].name.clone();

    for target in [
        DisplayTarget::Figure,
        DisplayTarget::layer("L"),
        DisplayTarget::entries("L", [name.as_str()]),
    ] {
        scene.toggle_display(None, target.clone()).unwrap();
        scene.toggle_display(None, target).unwrap();
    }
    let fig = scene.figure("F").unwrap();
    assert!(fig.display);
    assert!(fig.layer("L").unwrap().display);
    assert!(fig.layer("L").unwrap().entries()[0].display);

    let err = scene
        .toggle_display(None, DisplayTarget::entries("L", ["missing"]))
        .unwrap_err();
    assert!(matches!(err, SceneError::UnknownEntity { .. }));
}

#[test]
fn test_text_requires_text_layer() {
    let mut scene = figure_f();
    let err = scene
        .add_text(None, Some("L"), Point2::new(0.0, 0.0), "label", false)
        .add()
        .unwrap_err();
    assert!(matches!(err, SceneError::IncompatibleLayerKind { .. }));

    scene.add_layer(None, LayerSpec::new("notes").kind("text")).unwrap();
    let name = scene
        .add_text(None, None, Point2::new(0.5, 0.5), "label", true)
        .name("title")
        .add()
        .unwrap();
    assert_eq!(name, "title");
}

#[test]
fn test_unknown_figure_and_layer() {
    let mut scene = figure_f();
    assert!(matches!(
        scene.layer(Some("G"), "L"),
        Err(SceneError::UnknownEntity {
            kind: EntityKind::Figure,
            ..
        })
    ));
    assert!(matches!(
        scene.remove_layer(None, "M"),
        Err(SceneError::UnknownEntity {
            kind: EntityKind::Layer,
            ..
        })
    ));
}
