pub mod api;
pub mod config;
pub mod event;
pub mod logging;
pub mod notify;
pub mod ops;
pub mod progress;
pub mod table;
pub mod ui;

pub use api::{ApiError, BridgeClient, OpResponse};
pub use config::{AppConfig, endpoint};
pub use event::{AppEvent, Transfer};
pub use progress::{Progress, format_bytes};
pub use table::{Row, TableView, to_csv};
pub use ui::app::App;
