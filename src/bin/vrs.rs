/*
 * Copyright 2019-2020 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! A command line harness for the virtual resource system.

use std::env;
use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, warn};

use vrs_core::{
    DefaultTaskMonitor, TransferManager, TransferResult, VPath, Vrl, VrsConfig, VrsContext,
};

/// Browse and transfer resources across storage backends.
#[derive(Debug, Parser)]
#[command(name = "vrs", author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the children of a resource.
    Ls {
        /// The locator or local path to list.
        location: String,
    },

    /// Write the contents of a resource to standard output.
    Cat {
        /// The locator or local path to read.
        location: String,
    },

    /// Copy resources into a directory, or one resource onto a file.
    Copy {
        /// The locators or local paths to copy.
        #[arg(required = true)]
        sources: Vec<String>,

        /// The destination directory or file.
        destination: String,
    },

    /// Move resources into a directory, or one resource onto a file.
    Move {
        /// The locators or local paths to move.
        #[arg(required = true)]
        sources: Vec<String>,

        /// The destination directory or file.
        destination: String,
    },

    /// Create links to resources in an info folder.
    Link {
        /// The locators or local paths to link to.
        #[arg(required = true)]
        sources: Vec<String>,

        /// The info folder to create the links in, like `info:/servers`.
        destination: String,
    },

    /// Create a folder in the info tree.
    Mkfolder {
        /// The name of the folder.
        name: String,
    },

    /// Print the info tree in its persisted form.
    Tree,
}

/// Parse `text` as a locator, or as a local path if it has no scheme.
fn parse_location(text: &str) -> anyhow::Result<Vrl> {
    let has_scheme = text
        .split_once(':')
        .map_or(false, |(scheme, _)| scheme.len() > 1 && !scheme.contains('/'));
    if has_scheme {
        return Vrl::parse(text).with_context(|| format!("Invalid locator '{}'", text));
    }

    let path = env::current_dir()
        .context("Could not determine the current directory")?
        .join(text);
    Ok(Vrl::from_local_path(path)?)
}

fn parse_locations(texts: &[String]) -> anyhow::Result<Vec<Vrl>> {
    texts.iter().map(|text| parse_location(text)).collect()
}

fn print_result(result: &TransferResult, monitor: &DefaultTaskMonitor) {
    for line in monitor.log_lines() {
        info!("{}", line);
    }
    for path in &result.result_paths {
        println!("{}", path.vrl());
    }
    for skipped in &result.skipped {
        warn!("Skipped {}", skipped);
    }
}

fn run(context: Arc<VrsContext>, command: Command) -> anyhow::Result<()> {
    let manager = TransferManager::new(Arc::clone(&context));
    let monitor = DefaultTaskMonitor::new();

    match command {
        Command::Ls { location } => {
            let vrl = parse_location(&location)?;
            let path = context.open_existing_path(&vrl)?;
            let listable = match path.as_listable() {
                Some(listable) => listable,
                None => bail!("{} can't be listed", vrl),
            };
            for child in listable.list()? {
                let is_folder = match child.as_file_system() {
                    Some(fs_path) => fs_path.is_dir().unwrap_or(false),
                    None => child.as_listable().is_some(),
                };
                println!("{}{}", child.vrl(), if is_folder { "/" } else { "" });
            }
        }
        Command::Cat { location } => {
            let vrl = parse_location(&location)?;
            let mut input = context.create_input_stream(&vrl)?;
            let mut buffer = Vec::new();
            input.read_to_end(&mut buffer)?;
            io::stdout().write_all(&buffer)?;
        }
        Command::Copy {
            sources,
            destination,
        } => {
            let result = manager.transfer(
                &parse_locations(&sources)?,
                &parse_location(&destination)?,
                false,
                &monitor,
            )?;
            print_result(&result, &monitor);
        }
        Command::Move {
            sources,
            destination,
        } => {
            let result = manager.transfer(
                &parse_locations(&sources)?,
                &parse_location(&destination)?,
                true,
                &monitor,
            )?;
            print_result(&result, &monitor);
        }
        Command::Link {
            sources,
            destination,
        } => {
            let result = manager.link_drop(
                &parse_locations(&sources)?,
                &parse_location(&destination)?,
                &monitor,
            )?;
            print_result(&result, &monitor);
        }
        Command::Mkfolder { name } => {
            let folder = context.info_system().create_folder(&name)?;
            println!("{}", folder.vrl());
        }
        Command::Tree => {
            println!("{}", context.info_system().to_text()?);
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let context = Arc::new(VrsContext::new(VrsConfig::from_env()));
    let loaded = context.info_system().load_persistent_config();
    info!("Loaded {} info nodes", loaded);

    run(context, args.command)
}
