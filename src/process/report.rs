//! Human-readable process report.

use super::Process;
use std::collections::BTreeSet;
use std::fmt;

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process with pass name '{}'", self.pass_name)?;
        if self.run > 0 {
            write!(f, "\n using run number {}", self.run)?;
        }
        if self.max_events > 0 {
            write!(f, "\n Maximum events to process: {}", self.max_events)?;
        } else {
            write!(f, "\n No limit on maximum events to process")?;
        }

        let mut providers = self.conditions_object_providers().peekable();
        if providers.peek().is_some() {
            writeln!(f, "\n conditionsObjectProviders:")?;
            for provider in providers {
                write!(f, "\n{}", provider)?;
            }
        }

        write!(f, "\n Processor sequence:")?;
        for processor in &self.sequence {
            write!(f, "\n{}", processor)?;
        }

        if !self.input_files.is_empty() {
            if self.output_files.len() == self.input_files.len() {
                write!(f, "\n Files:")?;
                for (input, output) in self.input_files.iter().zip(&self.output_files) {
                    write!(f, "\n  '{}' -> '{}'", input, output)?;
                }
            } else {
                write!(f, "\n Input files:")?;
                for input in &self.input_files {
                    write!(f, "\n  {}", input)?;
                }
                if let Some(output) = self.output_files.first() {
                    write!(f, "\n Output file: {}", output)?;
                }
            }
        } else if let Some(output) = self.output_files.first() {
            write!(f, "\n Output file: {}", output)?;
        }

        write!(f, "\n Skim rules:")?;
        if self.skim_default_is_keep {
            write!(f, "\n  Default: keep the event")?;
        } else {
            write!(f, "\n  Default: drop the event")?;
        }
        for rule in &self.skim_rules {
            if rule.matches_any_label() {
                write!(
                    f,
                    "\n  Listen to hints from processors with names matching '{}'",
                    rule.name_pattern
                )?;
            } else {
                write!(
                    f,
                    "\n  Listen to hints with labels matching '{}' from processors with names matching '{}'",
                    rule.label_pattern, rule.name_pattern
                )?;
            }
        }

        if !self.keep.is_empty() {
            write!(f, "\n Rules for keeping previous products:")?;
            for rule in &self.keep {
                write!(f, "\n  {}", rule)?;
            }
        }

        if !self.libraries.is_empty() {
            write!(f, "\n Shared libraries to load:")?;
            let unique: BTreeSet<&String> = self.libraries.iter().collect();
            for library in unique {
                write!(f, "\n  {}", library)?;
            }
        }
        Ok(())
    }
}
