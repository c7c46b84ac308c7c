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

use std::fmt;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use vrs_core::fs::MemoryFileSystemFactory;
use vrs_core::{
    DefaultTaskMonitor, Deletable, Error, FsPath, ResourceSystem, ResourceSystemFactory,
    StreamReadable, StreamWritable, TaskMonitor, TransferSide, VPath, Vrl, VrsContext,
};

use common::*;

mod common;

/// A monitor which cancels itself once the first chunk of a stream has been copied.
#[derive(Default)]
struct CancelAfterFirstChunk {
    inner: DefaultTaskMonitor,
}

impl TaskMonitor for CancelAfterFirstChunk {
    fn start_task(&self, name: &str, total: u64) {
        self.inner.start_task(name, total)
    }

    fn update_done(&self, done: u64) {
        self.inner.update_done(done)
    }

    fn end_task(&self, name: &str) {
        self.inner.end_task(name)
    }

    fn update_sub_task_done(&self, _name: &str, _done: u64) {
        self.inner.cancel();
    }

    fn log(&self, message: fmt::Arguments<'_>) {
        self.inner.log(message)
    }

    fn set_exception(&self, error: &Error) {
        self.inner.set_exception(error)
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// A monitor which records when tasks start and end.
#[derive(Default)]
struct RecordingMonitor {
    inner: DefaultTaskMonitor,
    events: Mutex<Vec<String>>,
}

impl RecordingMonitor {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl TaskMonitor for RecordingMonitor {
    fn start_task(&self, name: &str, total: u64) {
        self.events.lock().unwrap().push(format!("start {}", name));
        self.inner.start_task(name, total)
    }

    fn update_done(&self, done: u64) {
        self.inner.update_done(done)
    }

    fn end_task(&self, name: &str) {
        self.events.lock().unwrap().push(format!("end {}", name));
        self.inner.end_task(name)
    }

    fn log(&self, message: fmt::Arguments<'_>) {
        self.inner.log(message)
    }

    fn set_exception(&self, error: &Error) {
        self.inner.set_exception(error)
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

/// A memory file system whose files claim to be deletable but can never be deleted.
#[derive(Debug)]
struct StuckFactory {
    inner: MemoryFileSystemFactory,
}

impl StuckFactory {
    fn new() -> Self {
        StuckFactory {
            inner: MemoryFileSystemFactory::new()
                .with_scheme("stuck")
                .with_file("/a", "payload"),
        }
    }
}

impl ResourceSystemFactory for StuckFactory {
    fn schemes(&self) -> &[&'static str] {
        &["stuck"]
    }

    fn create_resource_system_id(&self, vrl: &Vrl) -> String {
        self.inner.create_resource_system_id(vrl)
    }

    fn create_resource_system(
        &self,
        context: &VrsContext,
        vrl: &Vrl,
    ) -> vrs_core::Result<Arc<dyn ResourceSystem>> {
        Ok(Arc::new(StuckSystem(
            self.inner.create_resource_system(context, vrl)?,
        )))
    }
}

#[derive(Debug)]
struct StuckSystem(Arc<dyn ResourceSystem>);

impl ResourceSystem for StuckSystem {
    fn id(&self) -> &str {
        self.0.id()
    }

    fn resolve_path(&self, vrl: &Vrl) -> vrs_core::Result<Box<dyn VPath>> {
        Ok(Box::new(StuckPath(self.0.resolve_path(vrl)?)))
    }
}

#[derive(Debug)]
struct StuckPath(Box<dyn VPath>);

impl VPath for StuckPath {
    fn vrl(&self) -> &Vrl {
        self.0.vrl()
    }

    fn resource_system_id(&self) -> &str {
        self.0.resource_system_id()
    }

    fn as_readable(&self) -> Option<&dyn StreamReadable> {
        self.0.as_readable()
    }

    fn as_writable(&self) -> Option<&dyn StreamWritable> {
        self.0.as_writable()
    }

    fn as_deletable(&self) -> Option<&dyn Deletable> {
        Some(self)
    }

    fn as_file_system(&self) -> Option<&dyn FsPath> {
        self.0.as_file_system()
    }
}

impl Deletable for StuckPath {
    fn delete(&self) -> vrs_core::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "file is pinned").into())
    }
}

/// Build a context sharing the test directory of `context` which also serves `stuck:`.
fn stuck_context(context: &WithTempDir<Arc<VrsContext>>) -> Arc<VrsContext> {
    Arc::new(
        VrsContext::builder()
            .config(test_config(context.path()))
            .factory(Arc::new(StuckFactory::new()))
            .build(),
    )
}

fn mkdir(context: &VrsContext, vrl: &Vrl) {
    context
        .open_path(vrl)
        .unwrap()
        .as_file_system()
        .unwrap()
        .mkdir(true)
        .unwrap();
}

#[rstest]
fn move_within_resource_system_renames(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
    buffer: Vec<u8>,
) -> anyhow::Result<()> {
    let source = context.write_local("source", &buffer);
    let target = context.local("target");

    let result = manager(&context).transfer(&[source.clone()], &target, true, &monitor)?;

    assert_that!(result.bytes_copied).is_equal_to(0);
    assert_that!(monitor.current_sub_task()).is_none();
    assert_that!(result.result_vrls()).is_equal_to(vec![target.clone()]);
    assert_that!(result.deleted_paths).is_equal_to(vec![source.clone()]);
    assert_that!(exists(&context, &source)).is_false();
    assert_that!(read_resource(&context, &target)).is_equal_to(buffer);
    Ok(())
}

#[rstest]
fn move_across_resource_systems_copies_then_deletes(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
    larger_buffer: Vec<u8>,
) -> anyhow::Result<()> {
    let source = Vrl::parse("mem:/data")?;
    write_resource(&context, &source, &larger_buffer);
    let target = context.local("data");

    let result = manager(&context).transfer(&[source.clone()], &target, true, &monitor)?;

    assert_that!(result.bytes_copied).is_equal_to(larger_buffer.len() as u64);
    assert_that!(fs::read(context.local_path("data"))?).is_equal_to(&larger_buffer);
    assert_that!(exists(&context, &source)).is_false();
    assert_that!(result.deleted_paths).is_equal_to(vec![source]);

    let stats = monitor.sub_task_stats("data").unwrap();
    assert_that!(stats.done).is_equal_to(larger_buffer.len() as u64);
    assert_that!(stats.is_done()).is_true();
    assert_that!(monitor.is_done()).is_true();
    Ok(())
}

#[rstest]
fn move_of_undeletable_source_writes_nothing(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let source = Vrl::parse(READ_ONLY_FILE).unwrap();
    let target = context.local("copy");

    let result = manager(&context).transfer(&[source.clone()], &target, true, &monitor);

    assert_that!(result).is_err_variant(Error::SourceNotDeletable(source.clone()));
    assert_that!(context.local_path("copy").exists()).is_false();
    assert_that!(exists(&context, &source)).is_true();
    assert_that!(monitor.has_error()).is_true();
}

#[rstest]
fn copy_of_undeletable_source_succeeds(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    let source = Vrl::parse(READ_ONLY_FILE)?;
    let target = context.local("copy");

    manager(&context).transfer(&[source], &target, false, &monitor)?;

    let copied = fs::read(context.local_path("copy"))?;
    assert_that!(copied).is_equal_to(b"read-only data".to_vec());
    Ok(())
}

#[rstest]
fn bulk_copy_skips_directories(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
    buffer: Vec<u8>,
) -> anyhow::Result<()> {
    let file_a = context.write_local("fileA", &buffer);
    let file_b = context.write_local("fileB", b"second");
    let dir_c = context.local("dirC");
    fs::create_dir(context.local_path("dirC"))?;
    let destination = context.local("D");
    fs::create_dir(context.local_path("D"))?;

    let result = manager(&context).transfer(
        &[file_a.clone(), file_b.clone(), dir_c.clone()],
        &destination,
        false,
        &monitor,
    )?;

    assert_that!(result.success).is_true();
    assert_that!(result.result_vrls()).is_equal_to(vec![
        destination.append_path("fileA"),
        destination.append_path("fileB"),
    ]);
    assert_that!(result.skipped).is_equal_to(vec![dir_c]);
    assert_that!(result.deleted_paths).is_empty();
    assert_that!(fs::read(context.local_path("D/fileA"))?).is_equal_to(&buffer);
    assert_that!(context.local_path("D/dirC").exists()).is_false();
    assert_that!(exists(&context, &file_a)).is_true();
    let logged_skip = monitor
        .log_lines()
        .iter()
        .any(|line| line.contains("Skipping directory"));
    assert_that!(logged_skip).is_true();
    Ok(())
}

#[rstest]
fn bulk_copy_of_only_directories_is_not_a_success(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    fs::create_dir(context.local_path("dir"))?;
    fs::create_dir(context.local_path("D"))?;

    let result =
        manager(&context).transfer(&[context.local("dir")], &context.local("D"), false, &monitor)?;

    assert_that!(result.success).is_false();
    assert_that!(result.result_paths).is_empty();
    Ok(())
}

#[rstest]
fn bulk_move_records_its_own_deleted_paths(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    let sources = vec![Vrl::parse("mem:/one")?, Vrl::parse("mem:/two")?];
    for source in &sources {
        write_resource(&context, source, source.basename().as_bytes());
    }
    let destination = context.local("D");
    fs::create_dir(context.local_path("D"))?;

    let result = manager(&context).transfer(&sources, &destination, true, &monitor)?;

    assert_that!(result.deleted_paths).is_equal_to(&sources);
    assert_that!(result.result_vrls()).is_equal_to(vec![
        destination.append_path("one"),
        destination.append_path("two"),
    ]);
    for source in &sources {
        assert_that!(exists(&context, source)).is_false();
    }
    let moved = fs::read_to_string(context.local_path("D/two"))?;
    assert_that!(moved).is_equal_to(String::from("two"));
    Ok(())
}

#[rstest]
fn bulk_copy_into_memory_directory(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
    buffer: Vec<u8>,
) -> anyhow::Result<()> {
    let source = context.write_local("file", &buffer);
    let destination = Vrl::parse("mem:/dir")?;
    mkdir(&context, &destination);

    manager(&context).transfer(&[source], &destination, false, &monitor)?;

    let copied = read_resource(&context, &destination.append_path("file"));
    assert_that!(copied).is_equal_to(buffer);
    Ok(())
}

#[rstest]
fn multiple_sources_to_single_file_fail(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let first = context.write_local("first", b"1");
    let second = context.write_local("second", b"2");

    let result =
        manager(&context).transfer(&[first, second], &context.local("single"), false, &monitor);

    assert_that!(result).is_err_variant(Error::MultipleSourcesToSingleFile(2));
    assert_that!(context.local_path("single").exists()).is_false();
}

#[rstest]
fn empty_sources_are_invalid(context: WithTempDir<Arc<VrsContext>>, monitor: DefaultTaskMonitor) {
    let result = manager(&context).transfer(&[], &context.local("target"), false, &monitor);
    assert_that!(result).is_err_variant(Error::InvalidArgument(String::new()));
}

#[rstest]
fn info_destination_is_unsupported(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let source = context.write_local("file", b"data");
    let destination = Vrl::parse("info:/").unwrap();
    let result = manager(&context).transfer(&[source], &destination, false, &monitor);
    assert_that!(result).is_err_variant(Error::UnsupportedDestination(Vrl::local_root()));
}

#[rstest]
fn unreadable_source_is_unsupported(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let result = manager(&context).transfer(
        &[Vrl::parse("info:/").unwrap()],
        &context.local("target"),
        false,
        &monitor,
    );

    match result {
        Err(Error::UnsupportedTransfer { side, .. }) => {
            assert_that!(side).is_equal_to(TransferSide::Source)
        }
        other => panic!("expected an unsupported transfer, got {:?}", other),
    }
    assert_that!(context.local_path("target").exists()).is_false();
}

#[rstest]
fn read_only_destination_is_unsupported(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let source = context.write_local("file", b"data");
    let result = manager(&context).transfer(
        &[source],
        &Vrl::parse("rom:/new").unwrap(),
        false,
        &monitor,
    );

    match result {
        Err(Error::UnsupportedTransfer { side, .. }) => {
            assert_that!(side).is_equal_to(TransferSide::Destination)
        }
        other => panic!("expected an unsupported transfer, got {:?}", other),
    }
}

#[rstest]
fn transfer_onto_itself_is_invalid(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    let source = context.write_local("file", b"data");

    let result = manager(&context).transfer(&[source.clone()], &source, false, &monitor);

    assert_that!(result).is_err_variant(Error::InvalidArgument(String::new()));
    assert_that!(fs::read(context.local_path("file"))?).is_equal_to(b"data".to_vec());
    Ok(())
}

#[rstest]
fn cancelled_bulk_transfer_copies_nothing(context: WithTempDir<Arc<VrsContext>>) {
    let source = context.write_local("file", b"data");
    fs::create_dir(context.local_path("D")).unwrap();
    let monitor = DefaultTaskMonitor::new();
    monitor.cancel();

    let result = manager(&context).transfer(&[source], &context.local("D"), false, &monitor);

    assert_that!(result).is_err_variant(Error::Cancelled);
    assert_that!(context.local_path("D/file").exists()).is_false();
}

#[rstest]
fn cancelled_stream_copy_leaves_partial_target(
    context: WithTempDir<Arc<VrsContext>>,
    larger_buffer: Vec<u8>,
) -> anyhow::Result<()> {
    let source = Vrl::parse("mem:/large")?;
    write_resource(&context, &source, &larger_buffer);
    let monitor = CancelAfterFirstChunk::default();

    let result =
        manager(&context).transfer(&[source.clone()], &context.local("partial"), true, &monitor);

    assert_that!(result).is_err_variant(Error::Cancelled);
    let written = fs::metadata(context.local_path("partial"))?.len();
    assert_that!(written).is_greater_than(0);
    assert_that!(written).is_less_than(larger_buffer.len() as u64);
    // A cancelled move never deletes its source.
    assert_that!(exists(&context, &source)).is_true();
    Ok(())
}

#[rstest]
fn failure_after_partial_bulk_transfer_reports_completed(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let present = context.write_local("present", b"data");
    let missing = context.local("missing");
    let destination = context.local("D");
    fs::create_dir(context.local_path("D")).unwrap();

    let result = manager(&context).transfer(&[present, missing], &destination, false, &monitor);

    assert_that!(result).is_transfer_err_caused_by(Error::NotFound(Vrl::local_root()));
    match result {
        Err(Error::Transfer { completed, .. }) => {
            assert_that!(completed).is_equal_to(vec![destination.append_path("present")])
        }
        other => panic!("expected a transfer error, got {:?}", other),
    }
    assert_that!(context.local_path("D/present").exists()).is_true();
}

#[rstest]
fn link_drop_creates_links_in_info_folder(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    let source = context.write_local("linked", b"data");
    let folder = context.info_system().create_folder("links")?;
    let remote = Vrl::parse("sftp://example.com/")?;

    let result =
        manager(&context).link_drop(&[source.clone(), remote.clone()], folder.vrl(), &monitor)?;

    assert_that!(result.result_vrls()).is_equal_to(vec![
        Vrl::parse("info:/links/linked")?,
        Vrl::parse("info:/links/example.com")?,
    ]);
    let link = context
        .info_system()
        .find_node(&Vrl::parse("info:/links/linked")?)
        .unwrap();
    assert_that!(link.link_target()).is_equal_to(Some(&source));
    assert_that!(exists(&context, &source)).is_true();
    Ok(())
}

#[rstest]
fn link_drop_onto_directory_copies(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) -> anyhow::Result<()> {
    let source = context.write_local("file", b"data");
    fs::create_dir(context.local_path("D"))?;

    manager(&context).link_drop(&[source], &context.local("D"), &monitor)?;

    assert_that!(fs::read(context.local_path("D/file"))?).is_equal_to(b"data".to_vec());
    Ok(())
}

#[rstest]
fn link_drop_onto_config_is_unsupported(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let source = context.write_local("file", b"data");

    let config = Vrl::parse("info:/config").unwrap();
    let result = manager(&context).link_drop(&[source], &config, &monitor);

    assert_that!(result).is_err_variant(Error::UnsupportedLinkTarget(Vrl::local_root()));
}

#[rstest]
fn copy_of_directory_writes_nothing(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    fs::create_dir(context.local_path("srcdir")).unwrap();
    context.write_local("existing", b"keep");
    let manager = manager(&context);

    let onto_new = manager.transfer(
        &[context.local("srcdir")],
        &context.local("fresh"),
        false,
        &monitor,
    );
    let onto_file = manager.transfer(
        &[context.local("srcdir")],
        &context.local("existing"),
        false,
        &monitor,
    );

    assert_that!(onto_new).is_err_variant(Error::UnsupportedTransfer {
        side: TransferSide::Source,
        capability: "",
        vrl: Vrl::local_root(),
    });
    assert_that!(onto_file).is_err_variant(Error::UnsupportedTransfer {
        side: TransferSide::Source,
        capability: "",
        vrl: Vrl::local_root(),
    });
    assert_that!(context.local_path("fresh").exists()).is_false();
    assert_that!(fs::read(context.local_path("existing")).unwrap()).is_equal_to(b"keep".to_vec());
}

#[rstest]
fn move_of_directory_within_resource_system_renames(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    context.write_local("srcdir/inner", b"data");

    let result = manager(&context).transfer(
        &[context.local("srcdir")],
        &context.local("moved"),
        true,
        &monitor,
    );

    assert_that!(result).is_ok();
    assert_that!(context.local_path("srcdir").exists()).is_false();
    assert_that!(fs::read(context.local_path("moved/inner")).unwrap())
        .is_equal_to(b"data".to_vec());
}

#[rstest]
fn move_of_directory_into_itself_fails(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let directory = Vrl::parse("mem:/d").unwrap();
    let file = Vrl::parse("mem:/d/f").unwrap();
    mkdir(&context, &directory);
    write_resource(&context, &file, b"data");

    let result = manager(&context).transfer(
        &[directory],
        &Vrl::parse("mem:/d/sub").unwrap(),
        true,
        &monitor,
    );

    assert_that!(result).is_err_variant(Error::InvalidArgument(String::new()));
    assert_that!(read_resource(&context, &file)).is_equal_to(b"data".to_vec());
    assert_that!(exists(&context, &Vrl::parse("mem:/d/sub").unwrap())).is_false();
}

#[rstest]
fn failed_delete_after_move_keeps_both_copies(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let stuck = stuck_context(&context);
    let source = Vrl::parse("stuck:/a").unwrap();
    let target = context.local("target");

    let result = manager(&stuck).transfer(&[source.clone()], &target, true, &monitor);

    assert_that!(result).is_err_variant(Error::SourceDeleteFailed {
        source_vrl: Vrl::local_root(),
        target_vrl: Vrl::local_root(),
        cause: Box::new(Error::Cancelled),
    });
    if let Err(Error::SourceDeleteFailed {
        source_vrl,
        target_vrl,
        ..
    }) = &result
    {
        assert_that!(source_vrl.clone()).is_equal_to(source.clone());
        assert_that!(target_vrl.clone()).is_equal_to(target.clone());
    }
    assert_that!(fs::read(context.local_path("target")).unwrap())
        .is_equal_to(b"payload".to_vec());
    assert_that!(exists(&stuck, &source)).is_true();
}

#[rstest]
fn failed_delete_in_bulk_move_reports_written_target(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let stuck = stuck_context(&context);
    let source = Vrl::parse("stuck:/a").unwrap();
    fs::create_dir(context.local_path("dest")).unwrap();
    let destination = context.local("dest");

    let result = manager(&stuck).transfer(&[source.clone()], &destination, true, &monitor);

    assert_that!(result).is_transfer_err_caused_by(Error::SourceDeleteFailed {
        source_vrl: Vrl::local_root(),
        target_vrl: Vrl::local_root(),
        cause: Box::new(Error::Cancelled),
    });
    match &result {
        Err(Error::Transfer { completed, .. }) => {
            assert_that!(completed.clone()).is_equal_to(vec![context.local("dest/a")]);
        }
        other => panic!("expected a transfer error, got {:?}", other),
    }
    assert_that!(fs::read(context.local_path("dest/a")).unwrap())
        .is_equal_to(b"payload".to_vec());
    assert_that!(exists(&stuck, &source)).is_true();
}

#[rstest]
fn task_ends_only_after_it_started(context: WithTempDir<Arc<VrsContext>>) {
    let manager = manager(&context);
    let failed = RecordingMonitor::default();
    let succeeded = RecordingMonitor::default();
    let source = context.write_local("source", b"data");

    let no_sources = manager.transfer(&[], &context.local("target"), false, &failed);
    let copied = manager.transfer(&[source], &context.local("target"), false, &succeeded);

    assert_that!(no_sources).is_err_variant(Error::InvalidArgument(String::new()));
    assert_that!(failed.events()).is_empty();
    assert_that!(copied).is_ok();
    assert_that!(succeeded.events())
        .is_equal_to(vec![String::from("start Copy"), String::from("end Copy")]);
}

#[rstest]
fn cancelled_copy_leaves_existing_target_untouched(
    context: WithTempDir<Arc<VrsContext>>,
    monitor: DefaultTaskMonitor,
) {
    let source = context.write_local("source", b"new data");
    let target = context.write_local("target", b"keep");
    monitor.cancel();

    let result = manager(&context).transfer(&[source], &target, false, &monitor);

    assert_that!(result).is_err_variant(Error::Cancelled);
    assert_that!(fs::read(context.local_path("target")).unwrap()).is_equal_to(b"keep".to_vec());
}
