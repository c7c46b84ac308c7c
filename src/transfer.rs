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

//! Copying, moving and linking resources between resource systems.

use std::io::{self, Read, Write};
use std::sync::Arc;

use crate::context::VrsContext;
use crate::error::{Error, Result, TransferSide};
use crate::monitor_log;
use crate::path::{FsPath, StreamReadable, StreamWritable, VPath};
use crate::task::TaskMonitor;
use crate::vrl::Vrl;

/// The outcome of a transfer.
#[derive(Debug)]
pub struct TransferResult {
    /// The destination the transfer was made to.
    pub destination: Vrl,

    /// The paths which were created or renamed at the destination.
    pub result_paths: Vec<Box<dyn VPath>>,

    /// The sources which no longer exist because they were moved.
    pub deleted_paths: Vec<Vrl>,

    /// The sources which were skipped, like directories in a bulk transfer.
    pub skipped: Vec<Vrl>,

    /// The number of bytes streamed. A rename streams nothing.
    pub bytes_copied: u64,

    /// Whether at least one source was transferred.
    pub success: bool,

    task_started: bool,
}

impl TransferResult {
    fn new(destination: &Vrl) -> Self {
        TransferResult {
            destination: destination.clone(),
            result_paths: Vec::new(),
            deleted_paths: Vec::new(),
            skipped: Vec::new(),
            bytes_copied: 0,
            success: false,
            task_started: false,
        }
    }

    /// The locators of the paths in `result_paths`.
    pub fn result_vrls(&self) -> Vec<Vrl> {
        self.result_paths
            .iter()
            .map(|path| path.vrl().clone())
            .collect()
    }
}

/// Performs copy, move and link operations between paths.
///
/// The manager picks a strategy from the capabilities of the paths involved: a move within one
/// resource system is a rename, anything else between file system paths is a stream copy, and
/// dropping sources on a path which holds links creates links. Every operation runs on the
/// calling thread and reports through the [`TaskMonitor`] it is given.
#[derive(Debug, Clone)]
pub struct TransferManager {
    context: Arc<VrsContext>,
    buffer_size: usize,
}

impl TransferManager {
    /// Create a manager which resolves locators through `context`.
    pub fn new(context: Arc<VrsContext>) -> Self {
        let buffer_size = context.config().copy_buffer_size.max(1);
        TransferManager {
            context,
            buffer_size,
        }
    }

    /// The context this manager resolves locators through.
    pub fn context(&self) -> &Arc<VrsContext> {
        &self.context
    }

    /// Copy or move `sources` to `destination`.
    ///
    /// If `destination` is an existing directory, each source file is transferred into it under
    /// its own name and sources which are directories or not file system paths are skipped.
    /// Otherwise `destination` is a single file and there must be exactly one source.
    ///
    /// # Errors
    /// - `Error::InvalidArgument`: `sources` is empty.
    /// - `Error::UnsupportedDestination`: `destination` is not a file system path.
    /// - `Error::MultipleSourcesToSingleFile`: More than one source was given for a file.
    /// - `Error::UnsupportedTransfer`: A side can't be streamed, or the single source is a
    ///   directory which can't be renamed into place.
    /// - `Error::SourceNotDeletable`: `is_move` is set and the source can't be deleted. Nothing
    ///   is written in this case.
    /// - `Error::SourceDeleteFailed`: The source was copied but could not be deleted.
    /// - `Error::Cancelled`: The monitor was cancelled.
    /// - `Error::Transfer`: Any other failure, along with the targets completed before it.
    pub fn transfer(
        &self,
        sources: &[Vrl],
        destination: &Vrl,
        is_move: bool,
        monitor: &dyn TaskMonitor,
    ) -> Result<TransferResult> {
        let task_name = if is_move { "Move" } else { "Copy" };
        log::debug!(
            "{} {} source(s) to {}",
            task_name,
            sources.len(),
            destination
        );

        let mut result = TransferResult::new(destination);
        let outcome = self.run_transfer(sources, destination, is_move, monitor, &mut result);
        self.finish(task_name, outcome, result, monitor)
    }

    /// Drop `sources` on `destination`.
    ///
    /// If `destination` holds links, one link per source is created in it and the sources are
    /// not touched. If it is a file system path, the sources are copied into it instead.
    ///
    /// # Errors
    /// - `Error::InvalidArgument`: `sources` is empty.
    /// - `Error::UnsupportedLinkTarget`: `destination` can hold neither links nor copies.
    pub fn link_drop(
        &self,
        sources: &[Vrl],
        destination: &Vrl,
        monitor: &dyn TaskMonitor,
    ) -> Result<TransferResult> {
        let task_name = "Link";
        let mut result = TransferResult::new(destination);
        let outcome = self.run_link_drop(sources, destination, monitor, &mut result);
        match outcome {
            Ok(LinkDrop::Copy) => self.transfer(sources, destination, false, monitor),
            Ok(LinkDrop::Done) => self.finish(task_name, Ok(()), result, monitor),
            Err(error) => self.finish(task_name, Err(error), result, monitor),
        }
    }

    fn finish(
        &self,
        task_name: &str,
        outcome: Result<()>,
        result: TransferResult,
        monitor: &dyn TaskMonitor,
    ) -> Result<TransferResult> {
        match outcome {
            Ok(()) => {
                if result.task_started {
                    monitor.end_task(task_name);
                }
                log::info!(
                    "{} to {} done: {} transferred, {} skipped",
                    task_name,
                    result.destination,
                    result.result_paths.len(),
                    result.skipped.len()
                );
                Ok(result)
            }
            Err(error) => {
                monitor.set_exception(&error);
                log::error!("{} to {} failed: {}", task_name, result.destination, error);
                if result.task_started {
                    monitor.end_task(task_name);
                }

                let completed = result.result_vrls();
                Err(match error {
                    Error::Transfer { .. } => error,
                    error if error.is_transfer_kind() && completed.is_empty() => error,
                    error => Error::Transfer {
                        source: Box::new(error),
                        completed,
                    },
                })
            }
        }
    }

    fn run_transfer(
        &self,
        sources: &[Vrl],
        destination: &Vrl,
        is_move: bool,
        monitor: &dyn TaskMonitor,
        result: &mut TransferResult,
    ) -> Result<()> {
        if sources.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "no sources to transfer",
            )));
        }

        let target = self.context.open_path(destination)?;
        let target_dir = target
            .as_file_system()
            .ok_or_else(|| Error::UnsupportedDestination(destination.clone()))?;

        if target_dir.exists()? && target_dir.is_dir()? {
            self.transfer_to_directory(sources, target_dir, is_move, monitor, result)
        } else {
            self.transfer_to_file(sources, target, is_move, monitor, result)
        }
    }

    fn transfer_to_directory(
        &self,
        sources: &[Vrl],
        directory: &dyn FsPath,
        is_move: bool,
        monitor: &dyn TaskMonitor,
        result: &mut TransferResult,
    ) -> Result<()> {
        let task_name = if is_move { "Move" } else { "Copy" };
        monitor.start_task(task_name, sources.len() as u64);
        result.task_started = true;

        for (index, source_vrl) in sources.iter().enumerate() {
            if monitor.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let source = self.context.open_existing_path(source_vrl)?;
            let source_fs = match source.as_file_system() {
                Some(source_fs) => source_fs,
                None => {
                    monitor_log!(monitor, "Skipping {}: not a file system path", source_vrl);
                    result.skipped.push(source_vrl.clone());
                    continue;
                }
            };

            if source_fs.is_dir()? {
                monitor_log!(
                    monitor,
                    "Skipping directory {}: recursive transfers are not supported",
                    source_vrl
                );
                result.skipped.push(source_vrl.clone());
                continue;
            }

            let target = directory.resolve(source_vrl.basename())?;
            match self.transfer_file(source.as_ref(), target, is_move, monitor, result) {
                Ok(written) => result.result_paths.push(written),
                Err(error @ Error::SourceDeleteFailed { .. }) => {
                    // The target holds a full copy even though the source is still there.
                    result
                        .result_paths
                        .push(directory.resolve(source_vrl.basename())?);
                    return Err(error);
                }
                Err(error) => return Err(error),
            }
            if is_move {
                result.deleted_paths.push(source_vrl.clone());
            }

            monitor.update_done(index as u64 + 1);
        }

        result.success = !result.result_paths.is_empty();
        Ok(())
    }

    fn transfer_to_file(
        &self,
        sources: &[Vrl],
        target: Box<dyn VPath>,
        is_move: bool,
        monitor: &dyn TaskMonitor,
        result: &mut TransferResult,
    ) -> Result<()> {
        if sources.len() != 1 {
            return Err(Error::MultipleSourcesToSingleFile(sources.len()));
        }

        let task_name = if is_move { "Move" } else { "Copy" };
        monitor.start_task(task_name, 1);
        result.task_started = true;

        let source = self.context.open_existing_path(&sources[0])?;
        let written = self.transfer_file(source.as_ref(), target, is_move, monitor, result)?;
        result.result_paths.push(written);
        if is_move {
            result.deleted_paths.push(sources[0].clone());
        }

        monitor.update_done(1);
        result.success = true;
        Ok(())
    }

    /// Copy or move the single file `source` to `target` and return the written path.
    fn transfer_file(
        &self,
        source: &dyn VPath,
        target: Box<dyn VPath>,
        is_move: bool,
        monitor: &dyn TaskMonitor,
        result: &mut TransferResult,
    ) -> Result<Box<dyn VPath>> {
        if source.vrl() == target.vrl() {
            return Err(Error::InvalidArgument(format!(
                "source and destination are the same: {}",
                source.vrl()
            )));
        }

        if is_move && source.resource_system_id() == target.resource_system_id() {
            if let Some(renamable) = source.as_renamable() {
                monitor_log!(monitor, "Renaming {} to {}", source.vrl(), target.vrl());
                return renamable.rename_to(target.vrl());
            }
            log::debug!(
                "{} can't be renamed, falling back to copy and delete",
                source.vrl()
            );
        }

        if let Some(source_fs) = source.as_file_system() {
            if source_fs.is_dir()? {
                return Err(Error::UnsupportedTransfer {
                    side: TransferSide::Source,
                    capability: "a regular file",
                    vrl: source.vrl().clone(),
                });
            }
        }

        let readable = source
            .as_readable()
            .ok_or_else(|| Error::UnsupportedTransfer {
                side: TransferSide::Source,
                capability: "stream readable",
                vrl: source.vrl().clone(),
            })?;
        let writable = target
            .as_writable()
            .ok_or_else(|| Error::UnsupportedTransfer {
                side: TransferSide::Destination,
                capability: "stream writable",
                vrl: target.vrl().clone(),
            })?;

        // Check this before copying anything so a failed move has no side effects.
        let deletable = if is_move {
            Some(
                source
                    .as_deletable()
                    .ok_or_else(|| Error::SourceNotDeletable(source.vrl().clone()))?,
            )
        } else {
            None
        };

        monitor_log!(monitor, "Copying {} to {}", source.vrl(), target.vrl());
        result.bytes_copied +=
            self.stream_copy(source, readable, target.as_ref(), writable, monitor)?;

        if let Some(deletable) = deletable {
            deletable
                .delete()
                .map_err(|cause| Error::SourceDeleteFailed {
                    source_vrl: source.vrl().clone(),
                    target_vrl: target.vrl().clone(),
                    cause: Box::new(cause),
                })?;
            monitor_log!(monitor, "Deleted {}", source.vrl());
        }

        Ok(target)
    }

    /// Stream the contents of `source` into `target` and return the number of bytes copied.
    ///
    /// Both streams are closed on every exit path. A cancelled copy leaves the bytes written so
    /// far at the target.
    fn stream_copy(
        &self,
        source: &dyn VPath,
        readable: &dyn StreamReadable,
        target: &dyn VPath,
        writable: &dyn StreamWritable,
        monitor: &dyn TaskMonitor,
    ) -> Result<u64> {
        let sub_task = source.vrl().basename();
        let total = source
            .as_file_system()
            .and_then(|fs_path| fs_path.length().ok())
            .unwrap_or(0);
        if monitor.is_cancelled() {
            return Err(Error::Cancelled);
        }
        monitor.start_sub_task(sub_task, total);

        let mut input = readable.open_read()?;
        let mut output = writable.open_write()?;
        let copied = copy_chunks(
            input.as_mut(),
            output.as_mut(),
            self.buffer_size,
            |done| {
                monitor.update_sub_task_done(sub_task, done);
                !monitor.is_cancelled()
            },
        )?;
        output.flush()?;

        monitor.end_sub_task(sub_task);
        log::debug!("Copied {} bytes to {}", copied, target.vrl());
        Ok(copied)
    }

    fn run_link_drop(
        &self,
        sources: &[Vrl],
        destination: &Vrl,
        monitor: &dyn TaskMonitor,
        result: &mut TransferResult,
    ) -> Result<LinkDrop> {
        if sources.is_empty() {
            return Err(Error::InvalidArgument(String::from("no sources to link")));
        }

        let target = self.context.open_path(destination)?;
        let link_target = match target.as_link_target() {
            Some(link_target) => link_target,
            None if target.as_file_system().is_some() => return Ok(LinkDrop::Copy),
            None => return Err(Error::UnsupportedLinkTarget(destination.clone())),
        };

        monitor.start_task("Link", sources.len() as u64);
        result.task_started = true;
        for (index, source) in sources.iter().enumerate() {
            if monitor.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let link = link_target.create_link(source, &link_name(source))?;
            monitor_log!(monitor, "Linked {} as {}", source, link.vrl());
            result.result_paths.push(link);
            monitor.update_done(index as u64 + 1);
        }

        result.success = true;
        Ok(LinkDrop::Done)
    }
}

enum LinkDrop {
    Done,
    Copy,
}

/// The name of a link to `target`.
fn link_name(target: &Vrl) -> String {
    if !target.is_root() {
        target.basename().to_string()
    } else if let Some(host) = target.host() {
        host.to_string()
    } else {
        target.scheme().to_string()
    }
}

/// Copy `input` to `output` in chunks of `buffer_size` bytes.
///
/// After each chunk, `progress` is called with the total so far; the copy stops with
/// `Error::Cancelled` when it returns `false`.
fn copy_chunks(
    input: &mut dyn Read,
    output: &mut dyn Write,
    buffer_size: usize,
    mut progress: impl FnMut(u64) -> bool,
) -> Result<u64> {
    let mut buffer = vec![0u8; buffer_size];
    let mut done = 0u64;

    loop {
        let count = match input.read(&mut buffer) {
            Ok(0) => return Ok(done),
            Ok(count) => count,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };
        output.write_all(&buffer[..count])?;
        done += count as u64;

        if !progress(done) {
            return Err(Error::Cancelled);
        }
    }
}
