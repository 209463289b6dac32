/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use crate::server_error::LogError;
use serde::Serialize;
use std::fmt;
use std::ops::Deref;

pub const MAX_TOPIC_NAME_LENGTH: usize = 255;

/// Topic name that is safe to embed as a single object key path segment.
///
/// Allowed characters are ASCII letters, digits, `.`, `_` and `-`; the names
/// `.` and `..` are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TopicName(String);

impl TopicName {
    pub fn new(name: &str) -> Result<Self, LogError> {
        if name.is_empty() {
            return Err(LogError::InvalidTopicName(
                "topic name cannot be empty".to_owned(),
            ));
        }
        if name.len() > MAX_TOPIC_NAME_LENGTH {
            return Err(LogError::InvalidTopicName(format!(
                "topic name cannot be longer than {MAX_TOPIC_NAME_LENGTH} characters"
            )));
        }
        if name == "." || name == ".." {
            return Err(LogError::InvalidTopicName(format!(
                "topic name cannot be '{name}'"
            )));
        }
        if let Some(invalid) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(LogError::InvalidTopicName(format!(
                "topic name: {name} contains invalid character: {invalid:?}"
            )));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for TopicName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TopicName> for String {
    fn from(name: TopicName) -> Self {
        name.0
    }
}
