//! Executes reducer-emitted runtime effects in queue order.

use leptos::logging;
use platform_host::{join_child, parse_path};

use crate::{
    icons::{open_target_for_icon, OpenTarget},
    reducer::RuntimeEffect,
    runtime_context::DesktopRuntime,
};

impl DesktopRuntime {
    /// Runs one effect. Effects that only the presentation layer can carry out are forwarded to
    /// the host effect queue untouched.
    pub(crate) async fn run_effect(&mut self, effect: RuntimeEffect) {
        match effect {
            RuntimeEffect::PersistIconLayout => self.persist_icon_layout().await,
            RuntimeEffect::RefreshDesktopIcons => self.refresh_desktop_icons().await,
            RuntimeEffect::OpenIcon { icon_id } => self.open_icon(&icon_id).await,
            RuntimeEffect::MoveIntoFolder {
                icon_id,
                source_path,
                folder_path,
            } => self.move_into_folder(&icon_id, &source_path, &folder_path).await,
            presentation @ (RuntimeEffect::FocusWindowInput { .. }
            | RuntimeEffect::ShowIconContextMenu { .. }
            | RuntimeEffect::ArmLongPress { .. }
            | RuntimeEffect::CancelLongPress
            | RuntimeEffect::SetCursor(_)
            | RuntimeEffect::CapturePointer { .. }
            | RuntimeEffect::ReleasePointer { .. }
            | RuntimeEffect::ShowSnapPreview(_)) => self.host_effects.push(presentation),
        }
    }

    async fn open_icon(&mut self, icon_id: &str) {
        let Some(target) = self.state.icon(icon_id).and_then(open_target_for_icon) else {
            logging::warn!("icon `{icon_id}` has nothing to open");
            return;
        };
        match target {
            OpenTarget::LaunchApp { app_id, params } => {
                if let Err(err) = self.launch_window(app_id, params).await {
                    logging::warn!("opening icon `{icon_id}` failed: {err}");
                }
            }
            OpenTarget::Unsupported { path } => {
                let name = parse_path(&path).name;
                self.notify(
                    "Desktop",
                    &format!("Opening file \"{name}\" is not supported yet."),
                )
                .await;
            }
        }
    }

    async fn move_into_folder(&mut self, icon_id: &str, source_path: &str, folder_path: &str) {
        let name = parse_path(source_path).name;
        let destination = join_child(folder_path, &name, source_path.ends_with('/'));
        match self.host.vfs.rename_item(source_path, &destination).await {
            Ok(_) => logging::log!("moved `{source_path}` into `{folder_path}`"),
            Err(err) => {
                logging::warn!("moving icon `{icon_id}` into `{folder_path}` failed: {err}");
                self.notify("Desktop", &format!("Could not move \"{name}\": {err}"))
                    .await;
            }
        }
    }
}
