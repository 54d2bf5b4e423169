mod settings;

pub use settings::{Cli, ExportConfig, FetchConfig, Settings, load_settings};
