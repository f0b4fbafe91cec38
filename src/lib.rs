mod backend;
mod bridge;
mod controller;
mod report;

use std::path::PathBuf;

use backend::BackendSupervisor;
use bridge::{FetchOptions, SaveDialogOptions};
use controller::UiController;
use log::info;
use report::{ColumnSelection, GameRecord};
use tauri::{Manager, State};

pub(crate) struct AppState {
    controller: UiController,
    supervisor: BackendSupervisor,
}

#[tauri::command]
async fn fetch(
    url: String,
    options: Option<FetchOptions>,
    state: State<'_, AppState>,
) -> Result<serde_json::Value, String> {
    state
        .controller
        .fetch_json(&url, options.unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn show_save_dialog(
    window: tauri::WebviewWindow,
    options: Option<SaveDialogOptions>,
) -> Result<Option<String>, String> {
    bridge::save_dialog(&window, options.unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
fn get_username(state: State<'_, AppState>) -> Option<String> {
    state.controller.username()
}

#[tauri::command]
fn render_results(
    username: Option<String>,
    games: Vec<GameRecord>,
    columns: Option<ColumnSelection>,
    state: State<'_, AppState>,
) -> String {
    state
        .controller
        .render_results(username, &games, columns.unwrap_or_default())
}

fn backend_script(app: &tauri::App) -> PathBuf {
    // Development layout keeps the backend next to the crate.
    let dev = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("backend/backend.py");
    if dev.exists() {
        return dev;
    }
    app.path()
        .resource_dir()
        .map(|dir| dir.join("backend/backend.py"))
        .unwrap_or(dev)
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("SiliconCheck starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let supervisor = BackendSupervisor::for_host(backend_script(app));
            supervisor.start();

            app.manage(AppState {
                controller: UiController::new(),
                supervisor,
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            fetch,
            show_save_dialog,
            get_username,
            render_results,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| {
            // The worker must be gone before the process is allowed to exit.
            if let tauri::RunEvent::ExitRequested { .. } = event {
                app_handle.state::<AppState>().supervisor.stop();
            }
        });
}
