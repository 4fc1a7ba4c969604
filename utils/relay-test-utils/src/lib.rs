/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Scripted mock backends and helpers shared by the relay integration tests.

mod logging;
pub use logging::init_logging;
mod mock_source;
pub use mock_source::{register_mock_source, MockSource, SourceProbe};
mod mock_sender;
pub use mock_sender::{register_mock_sender, MockSender, SenderProbe};
mod wait;
pub use wait::wait_until;
