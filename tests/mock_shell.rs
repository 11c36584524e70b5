use std::sync::{Arc, Mutex};

use desk_companion::shell::{ShellCtx, SurfaceCmd};

/// Records every command the engine sends so tests can assert on the exact
/// traffic that would reach the windowing layer.
#[derive(Clone, Default)]
pub struct MockShell {
    pub commands: Arc<Mutex<Vec<SurfaceCmd>>>,
}

impl MockShell {
    #[allow(dead_code)]
    pub fn commands(&self) -> Vec<SurfaceCmd> {
        self.commands.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    #[allow(dead_code)]
    pub fn raise_count(&self) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, SurfaceCmd::RaiseGroup(_)))
            .count()
    }
}

impl ShellCtx for MockShell {
    fn send_surface_cmd(&self, cmd: SurfaceCmd) {
        self.commands.lock().unwrap().push(cmd);
    }

    fn request_repaint(&self) {}
}
