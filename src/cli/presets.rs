//! Presets subcommand implementation.

use crate::config::PortPreset;
use crate::error::CliResult;
use clap::Parser;
use std::io::{self, Write};

/// List the built-in port presets.
#[derive(Parser, Debug)]
pub struct PresetsCommand {
    /// Print the full port list of each preset
    #[arg(short, long)]
    pub expand: bool,
}

impl PresetsCommand {
    /// Execute the presets command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let stdout = io::stdout();
        self.write_to(&mut stdout.lock(), quiet)
    }

    fn write_to<W: Write>(&self, out: &mut W, quiet: bool) -> CliResult<()> {
        if !quiet {
            writeln!(out, "\n{:<10} {:>6}  {}", "NAME", "PORTS", "DESCRIPTION")?;
            writeln!(out, "{}", "-".repeat(60))?;
        }

        for preset in PortPreset::all() {
            let spec = preset.spec()?;
            writeln!(out, "{:<10} {:>6}  {}", preset.name, spec.len(), preset.description)?;
            if self.expand {
                writeln!(out, "{:<10} {}", "", spec)?;
            }
        }

        if !quiet {
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_every_preset() {
        let mut buf = Vec::new();
        PresetsCommand { expand: false }.write_to(&mut buf, true).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().count(), PortPreset::all().len());
        assert!(text.lines().any(|l| l.starts_with("full") && l.contains("65535")));
    }

    #[test]
    fn test_expand_prints_ports() {
        let mut buf = Vec::new();
        PresetsCommand { expand: true }.write_to(&mut buf, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("80,443,3000,8000,8080,8443,9000,9090"));
    }
}
