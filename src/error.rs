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

use std::io;
use std::result;

use thiserror::Error as DeriveError;

use crate::vrl::Vrl;

/// The error type for operations on the virtual resource system.
#[derive(Debug, DeriveError)]
pub enum Error {
    /// No resource system factory is registered for the scheme.
    #[error("Scheme not supported: {0}")]
    SchemeNotSupported(String),

    /// A locator string could not be parsed.
    #[error("Invalid locator '{text}': {reason}")]
    InvalidLocator { text: String, reason: &'static str },

    /// An argument passed to an operation was invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(Vrl),

    /// A resource already exists.
    #[error("Resource already exists: {0}")]
    AlreadyExists(Vrl),

    /// The directory is not empty.
    #[error("Directory is not empty: {0}")]
    NotEmpty(Vrl),

    /// The resource is not a directory.
    #[error("Not a directory: {0}")]
    NotDirectory(Vrl),

    /// The destination of a copy or move does not support it.
    #[error("Copy or move is not supported on destination: {0}")]
    UnsupportedDestination(Vrl),

    /// The destination of a link drop can hold neither copies nor links.
    #[error("Cannot create links in: {0}")]
    UnsupportedLinkTarget(Vrl),

    /// A source or destination lacks the stream capability needed for a transfer.
    #[error("Unsupported transfer, {side} is not {capability}: {vrl}")]
    UnsupportedTransfer {
        side: TransferSide,
        capability: &'static str,
        vrl: Vrl,
    },

    /// A move was requested for a source which cannot be deleted.
    #[error("Cannot move a source which cannot be deleted: {0}")]
    SourceNotDeletable(Vrl),

    /// More than one source was dropped onto a single file.
    #[error("Cannot transfer {0} sources onto a single file")]
    MultipleSourcesToSingleFile(usize),

    /// An info node with the given name exists but is a different kind of node.
    #[error("Info node '{name}' already exists as a {existing}")]
    TypeMismatch { name: String, existing: &'static str },

    /// The source was copied but could not be deleted afterwards.
    ///
    /// The data now exists both at the source and at the target.
    #[error("Copied {source_vrl} to {target_vrl} but failed to delete the source: {cause}")]
    SourceDeleteFailed {
        source_vrl: Vrl,
        target_vrl: Vrl,
        cause: Box<Error>,
    },

    /// A transfer failed.
    ///
    /// `completed` holds the targets which were fully written before the failure.
    #[error("Transfer failed: {source}")]
    Transfer {
        #[source]
        source: Box<Error>,
        completed: Vec<Vrl>,
    },

    /// The operation was cancelled through its task monitor.
    #[error("The operation was cancelled.")]
    Cancelled,

    /// A resource system could not be created or failed while in use.
    #[error("{0}")]
    ResourceSystem(#[from] anyhow::Error),

    /// A value could not be serialized.
    #[error("A value could not be serialized.")]
    Serialize,

    /// A value could not be deserialized.
    #[error("A value could not be deserialized.")]
    Deserialize,

    /// An I/O error occurred.
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Which end of a transfer an [`Error::UnsupportedTransfer`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    Source,
    Destination,
}

impl std::fmt::Display for TransferSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferSide::Source => f.write_str("source"),
            TransferSide::Destination => f.write_str("destination"),
        }
    }
}

impl Error {
    /// Whether this error is one of the typed failures a transfer reports as-is.
    ///
    /// Anything else is wrapped in [`Error::Transfer`] before it reaches the caller.
    pub(crate) fn is_transfer_kind(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::NotFound(_)
                | Error::SchemeNotSupported(_)
                | Error::InvalidLocator { .. }
                | Error::UnsupportedDestination(_)
                | Error::UnsupportedLinkTarget(_)
                | Error::UnsupportedTransfer { .. }
                | Error::SourceNotDeletable(_)
                | Error::MultipleSourcesToSingleFile(_)
                | Error::SourceDeleteFailed { .. }
                | Error::Transfer { .. }
                | Error::Cancelled
        )
    }
}

/// The result type for operations on the virtual resource system.
pub type Result<T> = result::Result<T, Error>;
