// This file is part of classic-car-market.
// Copyright (C) 2026 Classic Car Market contributors
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use derive_more::{Display, From, Into};
use std::error::Error as StdError;

/// Content ID of an uploaded file on the content-addressed storage network.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, From, Into)]
pub struct ContentId(pub String);

/// Content-addressed storage abstraction.
#[trait_variant::make(Send)]
pub trait ContentStore
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// Upload the given bytes as a named file and return its content ID. A rejected upload must
    /// abort any dependent operation; never proceed with a broken reference.
    async fn put(&self, bytes: Vec<u8>, file_name: &str) -> Result<ContentId, Self::Error>;

    /// The gateway domain retrieval URLs are composed with, e.g. `"ipfs.w3s.link"`.
    fn gateway_domain(&self) -> &str;
}

/// Compose the retrieval URL for an uploaded file: `https://{cid}.{gateway}/{segment}` with the
/// file name normalized into a URL segment.
pub fn retrieval_url(content_id: &ContentId, gateway_domain: &str, file_name: &str) -> String {
    format!("https://{content_id}.{gateway_domain}/{}", url_segment(file_name))
}

/// Normalize a file name into a URL path segment: trim, then percent-encode spaces. Only spaces
/// are escaped; this matches the names the storage gateway resolves.
pub fn url_segment(file_name: &str) -> String {
    file_name.trim().replace(' ', "%20")
}

/// The name of the metadata document for a car with the given name.
pub fn metadata_file_name(name: &str) -> String {
    format!("{}.json", name.trim())
}

#[cfg(test)]
mod tests {
    use crate::domain::{ContentId, metadata_file_name, retrieval_url, url_segment};

    #[test]
    fn test_url_segment() {
        assert_eq!(url_segment("Classic Mustang.json"), "Classic%20Mustang.json");
        assert_eq!(url_segment("Beetle.json"), "Beetle.json");
        assert_eq!(url_segment(" Classic  Mustang "), "Classic%20%20Mustang");
    }

    #[test]
    fn test_metadata_file_name() {
        assert_eq!(metadata_file_name("Classic Mustang"), "Classic Mustang.json");
        assert_eq!(metadata_file_name(" Beetle "), "Beetle.json");
    }

    #[test]
    fn test_retrieval_url() {
        let content_id = ContentId("bafybeigdyrzt".to_owned());
        let url = retrieval_url(&content_id, "ipfs.w3s.link", "Classic Mustang.json");
        assert_eq!(url, "https://bafybeigdyrzt.ipfs.w3s.link/Classic%20Mustang.json");
    }
}
