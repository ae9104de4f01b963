//! Error responses in the S3 `<Error>` XML format.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Error>
//!   <Code>MethodNotAllowed</Code>
//!   <Message>The specified method PATCH is not allowed against this resource</Message>
//!   <Resource>photos/cat.jpg</Resource>
//!   <RequestId>4a7b...</RequestId>
//! </Error>
//! ```

use std::io;

use bucketgate_core::GatewayError;
use http::header::{CONTENT_TYPE, HeaderValue};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use tracing::{error, warn};

use crate::body::GatewayBody;

/// Render an error document.
#[must_use]
pub fn error_to_xml(err: &GatewayError, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, err, request_id) {
        error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(buf: &mut Vec<u8>, err: &GatewayError, request_id: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(err.code.as_str()))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(&err.message))?;
        if let Some(resource) = err.resource.as_deref().filter(|r| !r.is_empty()) {
            w.create_element("Resource")
                .write_text_content(BytesText::new(resource))?;
        }
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;
    Ok(())
}

/// Convert an error into an HTTP response.
///
/// HEAD responses carry the status and headers but no body.
#[must_use]
pub fn error_to_response(
    err: &GatewayError,
    request_id: &str,
    method: &http::Method,
) -> http::Response<GatewayBody> {
    let body = if *method == http::Method::HEAD {
        GatewayBody::empty()
    } else {
        GatewayBody::from_bytes(error_to_xml(err, request_id))
    };

    let mut response = http::Response::new(body);
    *response.status_mut() = err.status_code;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));
    for (name, value) in &err.headers {
        match HeaderValue::from_str(value) {
            Ok(hv) => {
                headers.append(name.clone(), hv);
            }
            Err(_) => warn!(header = %name, "dropping invalid error response header"),
        }
    }
    response
}
