//! Composition root: one store shared by the renderer, controller, and controls.

use crate::compare::{BatchImport, ComparisonSession, ImportFile, Mode};
use crate::interact::{InteractionController, InteractionOptions, Notice};
use crate::render::{RenderOptions, Renderer, SharedRenderer, SvgRenderOptions};
use crate::ui::{ButtonStates, SavedDocument, UiControls};
use genesis_core::time::Clock;
use genesis_core::{EditorConfig, GraphStore, SharedStore};

#[derive(Debug)]
pub struct GenesisApp {
    config: EditorConfig,
    store: SharedStore,
    renderer: SharedRenderer,
    controller: InteractionController,
    ui: UiControls,
    comparison: ComparisonSession,
}

impl Default for GenesisApp {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl GenesisApp {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_clock(config, Clock::system())
    }

    pub fn with_clock(config: EditorConfig, clock: Clock) -> Self {
        let store = GraphStore::new()
            .with_clock(clock)
            .with_config(&config)
            .into_shared();
        let renderer = Renderer::attach(&store, RenderOptions::from_config(&config));
        let controller = InteractionController::new(
            store.clone(),
            renderer.clone(),
            InteractionOptions::from_config(&config),
        );
        let ui = UiControls::new(store.clone());
        let comparison = ComparisonSession::new().with_clock(clock);
        tracing::debug!("genesis app ready");
        Self {
            config,
            store,
            renderer,
            controller,
            ui,
            comparison,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn renderer(&self) -> &SharedRenderer {
        &self.renderer
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn ui(&self) -> &UiControls {
        &self.ui
    }

    pub fn comparison(&self) -> &ComparisonSession {
        &self.comparison
    }

    pub fn mode(&self) -> Mode {
        self.comparison.mode()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.comparison.set_mode(mode);
    }

    pub fn button_states(&self) -> ButtonStates {
        self.ui.button_states(&self.controller)
    }

    pub fn load_text(&mut self, text: &str) -> Result<(), Notice> {
        self.ui.load_text(&mut self.controller, text)
    }

    pub fn save(&self) -> genesis_core::Result<SavedDocument> {
        self.ui.save()
    }

    pub fn reset(&mut self) {
        self.ui.reset(&mut self.controller);
    }

    pub fn add_child(&mut self) -> Result<String, Notice> {
        self.ui.add_child(&mut self.controller)
    }

    pub fn start_link(&mut self) -> Result<(), Notice> {
        self.ui.start_link(&mut self.controller)
    }

    pub fn cancel_link(&mut self) -> bool {
        self.ui.cancel_link(&mut self.controller)
    }

    pub fn delete_selected(&mut self) -> Result<(), Notice> {
        self.ui.delete_selected(&mut self.controller)
    }

    pub fn import_files(&mut self, files: impl IntoIterator<Item = ImportFile>) -> BatchImport {
        self.comparison.import_batch(files)
    }

    /// Opens record `id` in the editor and returns to free mode. `Ok(false)` for an unknown id.
    pub fn load_record(&mut self, id: &str) -> Result<bool, Notice> {
        if self.comparison.record(id).is_none() {
            return Ok(false);
        }
        self.controller.cancel_linking();
        self.controller.clear_selection();
        let loaded = self
            .comparison
            .load_record(id, &mut self.store.borrow_mut())?;
        self.controller.sync_with_store();
        if loaded {
            self.comparison.set_mode(Mode::Free);
        }
        Ok(loaded)
    }

    /// Whole-document SVG on a white background.
    pub fn export_svg(&self) -> String {
        let opts = SvgRenderOptions {
            diagram_id: Some("genesis-mind".to_string()),
            ..SvgRenderOptions::default()
        }
        .with_background("white");
        crate::render::render_export_svg(&self.renderer.borrow(), &opts)
    }

    #[cfg(feature = "raster")]
    pub fn export_image(
        &self,
        options: &crate::render::raster::ExportOptions,
    ) -> crate::render::raster::ExportOutput {
        crate::render::raster::export_image(&self.renderer.borrow(), options)
    }
}
