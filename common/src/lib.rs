pub mod adjust;
pub mod commit;
pub mod conf;
pub mod config;
pub mod display;
pub mod error;
pub mod live;
pub mod merge;
pub mod routes;
pub mod schedule;
pub mod sync;
pub mod types;
pub mod weather;

pub use adjust::{AdjustmentController, PendingAdjustment};
pub use commit::{Commit, CommitForm, TelemetryForm};
pub use conf::{ConfPatch, ThermostatConf};
pub use config::{DisplaySettings, RuntimeConfig};
pub use display::DisplayModel;
pub use error::{StoreError, TargetError, UpstreamError, ValidationError};
pub use live::{LiveState, LiveStatePatch};
pub use routes::*;
pub use sync::{SyncAction, SyncClient};
pub use types::{Celsius, OperationMode, SeasonMode, SessionId};
pub use weather::WeatherReport;
