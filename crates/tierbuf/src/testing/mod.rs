// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Utilities for testing code that uses `tierbuf` buffers.

mod fake_storage;

pub use fake_storage::*;
