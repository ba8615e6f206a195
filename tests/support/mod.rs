//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

/// Key used across fixtures: base64 of the 7 bytes `testkey`.
pub const TEST_KEY: &str = "dGVzdGtleQ==";

/// Base64 MD5 digest of the decoded `testkey` bytes.
pub const TEST_KEY_MD5: &str = "Ihs2jX9fWXhn9SWXHyj/dQ==";

/// Renders a `ListObjectsV2` response body.
pub fn list_objects_xml(
    bucket: &str,
    prefix: &str,
    keys: &[&str],
    next_token: Option<&str>,
) -> String {
    let contents: String = keys
        .iter()
        .map(|key| {
            format!(
                "<Contents><Key>{key}</Key><LastModified>2023-02-01T00:00:00.000Z</LastModified><Size>3</Size><StorageClass>STANDARD</StorageClass></Contents>"
            )
        })
        .collect();
    let (truncated, token) = match next_token {
        Some(token) => (
            "true",
            format!("<NextContinuationToken>{token}</NextContinuationToken>"),
        ),
        None => ("false", String::new()),
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Name>{bucket}</Name><Prefix>{prefix}</Prefix><KeyCount>{count}</KeyCount><MaxKeys>1000</MaxKeys><IsTruncated>{truncated}</IsTruncated>{token}{contents}</ListBucketResult>"#,
        count = keys.len()
    )
}

/// Renders an S3 error response body.
pub fn s3_error_xml(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>{code}</Code><Message>{message}</Message><RequestId>TEST</RequestId><HostId>TEST</HostId></Error>"#
    )
}
