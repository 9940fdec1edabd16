use super::Host;
use super::config::{Config, DEFAULT_CONFIG_FILE};
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::app_err;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output configuration file path (default is `trends.toml` in the current directory)
    #[arg(value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Overwrite the file if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn init_config<H: Host>(host: &mut H, args: &InitArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CONFIG_FILE));

    if output.exists() && !args.force {
        return Err(app_err!("'{output}' already exists; pass --force to overwrite it"));
    }

    Config::save_default(&output)?;
    let _ = writeln!(host.output(), "Generated default configuration file: {output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use camino::Utf8Path;

    #[test]
    fn test_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("trends.toml");

        let mut host = TestHost::new();
        init_config(&mut host, &InitArgs { output: Some(path.clone()), force: false }).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), super::super::config::DEFAULT_CONFIG_TOML);
        assert!(host.output_text().contains("Generated default configuration file"));
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("trends.toml");
        std::fs::write(&path, "network_id = \"N_1\"\n").unwrap();

        let mut host = TestHost::new();
        assert!(init_config(&mut host, &InitArgs { output: Some(path.clone()), force: false }).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "network_id = \"N_1\"\n");

        init_config(&mut host, &InitArgs { output: Some(path.clone()), force: true }).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "network_id = \"N_1\"\n");
    }
}
