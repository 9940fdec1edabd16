use super::Host;
use super::config::Config;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `trends.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_ref();

    match Config::load(Utf8Path::new("."), config_path) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using trends.toml if present, otherwise defaults");
            }

            if config.network_id.is_none() {
                let _ = writeln!(host.output(), "Note: no network_id set; pass --network-id when fetching");
            }
            if config.start_date.is_none() {
                let _ = writeln!(host.output(), "Note: no start_date set; pass --start-date when fetching");
            }
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::commands::init::{InitArgs, init_config};

    fn write_config(name: &str, text: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = Utf8Path::from_path(dir.path()).unwrap().join(name);
        std::fs::write(&path, text).expect("Failed to write test config");
        (dir, path)
    }

    #[test]
    fn test_default_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = Utf8Path::from_path(dir.path()).unwrap().join("trends.toml");

        let mut init_host = TestHost::new();
        init_config(&mut init_host, &InitArgs { output: Some(config_path.clone()), force: false }).expect("init_config should succeed");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_ok(), "Default configuration should validate successfully: {result:?}");
        assert!(host.output_text().contains("Configuration file is valid"));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    fn test_complete_config_has_no_notes() {
        let (_dir, path) = write_config(
            "complete.toml",
            r#"
network_id = "N_1"
start_date = "2024-01-01"
band = "2.4"
ssid = "Guest"
"#,
        );

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(path) }).unwrap();
        assert!(!host.output_text().contains("Note:"));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let (_dir, path) = write_config("invalid_syntax.toml", "network_id = \"N_1\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });

        assert!(result.is_err(), "Invalid TOML syntax should fail validation");
        assert_eq!(host.exit_code, Some(1));
        assert!(host.error_text().contains("Configuration validation failed"));
    }

    #[test]
    fn test_unknown_field() {
        let (_dir, path) = write_config("unknown_field.toml", "unknown_field = \"value\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });
        assert!(result.is_err(), "Unknown field should fail validation");
    }

    #[test]
    fn test_invalid_band() {
        let (_dir, path) = write_config("band.toml", "band = \"60\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });
        assert!(result.is_err(), "Unknown band should fail validation");
    }

    #[test]
    fn test_negative_days() {
        let (_dir, path) = write_config("days.toml", "num_days = -1\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });
        assert!(result.is_err(), "Negative day count should fail validation");
    }

    #[test]
    fn test_empty_config_is_valid() {
        let (_dir, path) = write_config("empty.toml", "# Empty config file\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });
        assert!(result.is_ok(), "Empty config should be valid (uses defaults)");
        assert!(host.output_text().contains("Note: no network_id set"));
    }
}
