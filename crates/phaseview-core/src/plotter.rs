//! Plotter: a scene model bound to a render backend
//!
//! Owns the scene, the synchronization state and the backend, and offers
//! `show`/`save` plus data setters that keep already-drawn handles current.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use phaseview_geom::Point2;
use tracing::{debug, info, warn};

use crate::config::{OutputConfig, ViewerConfig};
use crate::error::{EntityKind, ExportError, PhaseviewResult, RenderResult, SceneError};
use crate::naming::NameGenerator;
use crate::render::{RenderBackend, RenderSync, SyncOptions, SyncReport};
use crate::scene::{first_listing, Coords, EntryPayload, SceneModel};

/// Which figures `show` reconciles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShowScope {
    Current,
    All,
    Figure(String),
}

/// Command entered at the pause after `show`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PauseCommand {
    Continue,
    /// Stop pausing after every `show`
    StopWaiting,
    /// Stop pausing and save every subsequent frame
    SaveAll,
    /// Save this frame and continue
    SaveThis,
}

impl FromStr for PauseCommand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "N" | "n" => PauseCommand::StopWaiting,
            "A" | "a" => PauseCommand::SaveAll,
            "S" | "s" => PauseCommand::SaveThis,
            _ => PauseCommand::Continue,
        })
    }
}

/// Source of pause commands
pub trait PausePrompt {
    fn ask(&mut self, figure: &str) -> PauseCommand;
}

/// Prompts on stdout and reads a line from stdin
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl PausePrompt for StdinPrompt {
    fn ask(&mut self, figure: &str) -> PauseCommand {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "Commands:\n=========");
        let _ = writeln!(out, "N <RETURN>: Stop waiting on each iteration");
        let _ = writeln!(out, "A <RETURN>: Stop waiting and save all figures on iterations");
        let _ = writeln!(out, "S <RETURN>: Save this figure and continue");
        let _ = write!(out, "[{}] Enter command or <RETURN> to continue: ", figure);
        let _ = out.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            // end of input: nobody is there to answer again
            Ok(0) => PauseCommand::StopWaiting,
            Ok(_) => line.parse().unwrap_or(PauseCommand::Continue),
            Err(e) => {
                warn!(error = %e, "failed to read pause command");
                PauseCommand::Continue
            }
        }
    }
}

/// Replays a fixed sequence of commands, then continues
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    commands: VecDeque<PauseCommand>,
}

impl ScriptedPrompt {
    pub fn new(commands: impl IntoIterator<Item = PauseCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.commands.len()
    }
}

impl PausePrompt for ScriptedPrompt {
    fn ask(&mut self, _figure: &str) -> PauseCommand {
        self.commands.pop_front().unwrap_or(PauseCommand::Continue)
    }
}

/// Scene model, render synchronization and backend
pub struct Plotter<B> {
    scene: SceneModel,
    sync: RenderSync,
    backend: B,
    output: OutputConfig,
    wait_status: bool,
    save_status: bool,
    save_names: NameGenerator,
}

impl<B: RenderBackend> Plotter<B> {
    pub fn new(backend: B, config: &ViewerConfig) -> Self {
        Self {
            scene: SceneModel::with_palette(config.palette.clone()),
            sync: RenderSync::new(),
            backend,
            output: config.output.clone(),
            wait_status: config.output.wait,
            save_status: false,
            save_names: NameGenerator::new(),
        }
    }

    pub fn scene(&self) -> &SceneModel {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneModel {
        &mut self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub(crate) fn sync_mut(&mut self) -> &mut RenderSync {
        &mut self.sync
    }

    /// Pause for a command after every `show`
    pub fn wait_status(&self) -> bool {
        self.wait_status
    }

    pub fn set_wait_status(&mut self, wait: bool) {
        self.wait_status = wait;
    }

    /// Save every frame after `show`
    pub fn save_status(&self) -> bool {
        self.save_status
    }

    // ===== Rendering =====

    /// Reconcile one figure with the backend
    pub fn render_figure(&mut self, figure: &str, options: SyncOptions) -> RenderResult<SyncReport> {
        self.sync
            .sync_figure(&mut self.scene, &mut self.backend, figure, options)
    }

    fn scope_figures(&self, scope: &ShowScope) -> PhaseviewResult<Vec<String>> {
        Ok(match scope {
            ShowScope::Current => vec![self.scene.resolve_figure(None)?],
            ShowScope::All => self.scene.figures().iter().map(|f| f.name.clone()).collect(),
            ShowScope::Figure(name) => vec![self.scene.resolve_figure(Some(name))?],
        })
    }

    /// Reconcile figures, then optionally pause for a command
    ///
    /// `scope = None` skips reconciliation. `force_wait` overrides the wait
    /// status for this call. Returns the path of an image saved as a result
    /// of the pause command or the save status.
    pub fn show(
        &mut self,
        scope: Option<ShowScope>,
        rebuild: bool,
        force_wait: Option<bool>,
        prompt: &mut dyn PausePrompt,
    ) -> PhaseviewResult<Option<PathBuf>> {
        if let Some(scope) = scope {
            for figure in self.scope_figures(&scope)? {
                self.render_figure(
                    &figure,
                    SyncOptions {
                        rebuild,
                        rescale: None,
                    },
                )?;
            }
        }

        let Some(current) = self.scene.current_figure().map(str::to_string) else {
            return Ok(None);
        };
        let mut do_save = false;
        if force_wait.unwrap_or(self.wait_status) {
            match prompt.ask(&current) {
                PauseCommand::Continue => {}
                PauseCommand::StopWaiting => self.wait_status = false,
                PauseCommand::SaveThis => do_save = true,
                PauseCommand::SaveAll => {
                    self.save_status = true;
                    self.wait_status = false;
                }
            }
        }
        if self.save_status || do_save {
            return Ok(Some(self.save(Some(&current), None)?));
        }
        Ok(None)
    }

    /// Export a figure (the current one by default) as `<name>_<n>.<format>`
    ///
    /// The directory defaults to the configured output directory, then the
    /// working directory.
    pub fn save(&mut self, figure: Option<&str>, dir: Option<&Path>) -> PhaseviewResult<PathBuf> {
        let fig = self.scene.get_figure(figure)?;
        let (name, fignum) = (fig.name.clone(), fig.fignum);

        let dir = dir
            .map(Path::to_path_buf)
            .or_else(|| self.output.directory.clone())
            .unwrap_or_default();
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            return Err(ExportError::InvalidPath { path: dir }.into());
        }
        let file = format!("{}.{}", self.save_names.next(&name), self.output.format);
        let path = dir.join(file);
        self.backend
            .save_image(fignum, &path, &self.output.format)
            .map_err(|e| ExportError::Backend {
                path: path.clone(),
                message: e.to_string(),
            })?;
        info!(figure = %name, path = %path.display(), "saved figure");
        Ok(path)
    }

    // ===== Data setters that keep handles current =====

    /// Replace an entry's coordinates, updating its handle if drawn
    pub fn set_data(&mut self, figure: Option<&str>, layer: &str, name: &str, coords: Coords) -> PhaseviewResult<()> {
        let figure = self.scene.resolve_figure(figure)?;
        self.scene.set_data(Some(&figure), layer, name, coords)?;
        self.push(&figure, layer, name)
    }

    pub fn set_point(&mut self, figure: Option<&str>, layer: &str, name: &str, point: Point2) -> PhaseviewResult<()> {
        self.set_data(figure, layer, name, Coords::point(point))
    }

    pub fn set_text(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        name: &str,
        text: &str,
        position: Option<Point2>,
    ) -> PhaseviewResult<()> {
        let figure = self.scene.resolve_figure(figure)?;
        self.scene.set_text(Some(&figure), layer, name, text, position)?;
        self.push(&figure, layer, name)
    }

    fn push(&mut self, figure: &str, layer: &str, name: &str) -> PhaseviewResult<()> {
        let pushed = self
            .sync
            .push_entry(&mut self.scene, &mut self.backend, figure, layer, name)?;
        if pushed {
            let fignum = self.scene.get_figure(Some(figure))?.fignum;
            self.backend.redraw(fignum)?;
        }
        Ok(())
    }

    // ===== Figure-level helpers =====

    /// Remove a figure and close its surface
    pub fn remove_figure(&mut self, name: &str) -> PhaseviewResult<()> {
        self.scene.remove_figure(name)?;
        self.sync.collect_retired(&mut self.scene, &mut self.backend)?;
        Ok(())
    }

    /// Remove line and point primitives from a sub-plot (by position code
    /// or name), keeping its title and labels
    ///
    /// Entries drawn there are redrawn on the next render pass.
    pub fn clear_axes(&mut self, figure: Option<&str>, subplot: &str) -> PhaseviewResult<()> {
        let fig = self.scene.get_figure_mut(figure)?;
        let target = fig
            .arrange
            .iter()
            .find(|s| s.matches(subplot))
            .ok_or_else(|| SceneError::unknown(EntityKind::Subplot, subplot))?;
        let (position, axes) = (target.position, target.surface);

        let arrange = &fig.arrange;
        for layer in &mut fig.layers {
            let listed = first_listing(arrange, &layer.name);
            for entry in &layer.entries {
                let line_like = matches!(entry.payload, EntryPayload::Points(_));
                if line_like && entry.subplot.or(listed) == Some(position) {
                    layer.handles.remove(&entry.name);
                }
            }
        }
        if let Some(axes) = axes {
            self.backend.clear_lines(axes)?;
            debug!(subplot, %axes, "cleared axes lines");
        }
        Ok(())
    }
}
