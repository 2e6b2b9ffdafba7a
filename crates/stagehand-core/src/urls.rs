// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! URL resolution for lifecycle bundles, downloads and uploads.

use std::time::Duration;

use url::Url;

use crate::error::{Result, StagingError};

/// Route under which the file server exposes static assets.
pub const FILE_SERVER_STATIC_ROUTE: &str = "/v1/static";

/// Resolve a configured lifecycle bundle location to a download URL.
///
/// Absolute http(s) URLs are used verbatim. A location without a scheme is a
/// path relative to the file server's static route. Other schemes are errors.
pub fn resolve_lifecycle_location(file_server_url: &str, location: &str) -> Result<String> {
    match Url::parse(location) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(location.to_string()),
            scheme => Err(StagingError::UnsupportedLifecycleScheme {
                scheme: scheme.to_string(),
                url: location.to_string(),
            }),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = format!(
                "{}{}/{}",
                file_server_url.trim_end_matches('/'),
                FILE_SERVER_STATIC_ROUTE,
                location.trim_start_matches('/')
            );
            parse("file server", &joined)?;
            Ok(joined)
        }
        Err(e) => Err(StagingError::InvalidLifecycleUrl {
            url: location.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Check that `value` is an absolute URL.
pub fn validate(field: &'static str, value: &str) -> Result<()> {
    parse(field, value).map(|_| ())
}

fn parse(field: &'static str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| StagingError::InvalidUrl {
        field,
        url: value.to_string(),
        message: e.to_string(),
    })
}

/// Uploader URL for a droplet.
pub fn droplet_upload_url(
    cc_uploader_url: &str,
    staging_guid: &str,
    droplet_upload_uri: &str,
    timeout: Duration,
) -> Result<String> {
    uploader_url(
        cc_uploader_url,
        "droplet",
        staging_guid,
        "cc-droplet-upload-uri",
        droplet_upload_uri,
        timeout,
    )
}

/// Uploader URL for a build artifacts cache.
pub fn build_artifacts_upload_url(
    cc_uploader_url: &str,
    staging_guid: &str,
    cache_upload_uri: &str,
    timeout: Duration,
) -> Result<String> {
    uploader_url(
        cc_uploader_url,
        "build_artifacts",
        staging_guid,
        "cc-build-artifacts-upload-uri",
        cache_upload_uri,
        timeout,
    )
}

fn uploader_url(
    cc_uploader_url: &str,
    route: &str,
    staging_guid: &str,
    target_param: &str,
    target: &str,
    timeout: Duration,
) -> Result<String> {
    validate("upload target", target)?;

    let base = format!(
        "{}/v1/{}/{}",
        cc_uploader_url.trim_end_matches('/'),
        route,
        staging_guid
    );
    let mut url = parse("uploader", &base)?;
    url.query_pairs_mut()
        .append_pair(target_param, target)
        .append_pair("timeout", &timeout.as_secs().to_string());
    Ok(url.to_string())
}
