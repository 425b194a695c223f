//! Cursor pagination glue shared by list endpoints.

use actix_web::HttpRequest;
use pagination::{PageParams, Paginated, PaginationLinks};
use serde::Serialize;
use serde_json::json;
use url::Url;
use utoipa::ToSchema;

use crate::domain::{Error, PageKey};

/// Page of items with hypermedia links.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageBody<T> {
    pub data: Vec<T>,
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[schema(value_type = Object)]
    pub links: PaginationLinks,
}

/// Decode the `cursor` parameter into the key of the last item seen.
pub(crate) fn decode_page_key(params: &PageParams) -> Result<Option<PageKey>, Error> {
    params
        .decode_cursor::<PageKey>()
        .map(|cursor| cursor.map(pagination::Cursor::into_key))
        .map_err(|err| {
            Error::invalid_request("cursor is malformed").with_details(json!({
                "field": "cursor",
                "code": "invalid_cursor",
                "reason": err.to_string(),
            }))
        })
}

fn request_url(req: &HttpRequest) -> Result<Url, Error> {
    let info = req.connection_info();
    let raw = format!("{}://{}{}", info.scheme(), info.host(), req.uri());
    Url::parse(&raw).map_err(|err| Error::internal(format!("request URL is invalid: {err}")))
}

/// Wrap a page with `self` and `next` links derived from the request URL.
pub(crate) fn page_body<T>(req: &HttpRequest, page: Paginated<T>) -> Result<PageBody<T>, Error> {
    let url = request_url(req)?;
    let links = PaginationLinks::from_request(&url, page.limit, page.next_cursor.as_deref());
    Ok(PageBody {
        data: page.data,
        limit: page.limit,
        next_cursor: page.next_cursor,
        links,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::test::TestRequest;
    use chrono::{TimeZone, Utc};
    use pagination::Cursor;
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    fn malformed_cursors_are_bad_requests() {
        let params = PageParams {
            cursor: Some("%%%".to_owned()),
            limit: None,
        };
        let err = decode_page_key(&params).expect_err("malformed");
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[rstest]
    fn cursors_decode_to_page_keys() {
        let key = PageKey::new(
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0)
                .single()
                .expect("instant"),
            Uuid::nil(),
        );
        let token = Cursor::new(key).encode().expect("encodes");
        let params = PageParams {
            cursor: Some(token),
            limit: Some(10),
        };
        assert_eq!(decode_page_key(&params).expect("decodes"), Some(key));
    }

    #[rstest]
    fn next_link_carries_cursor_and_limit() {
        let req = TestRequest::get()
            .uri("/api/v1/notifications?unreadOnly=true")
            .insert_header(("Host", "api.example.com"))
            .to_http_request();
        let page = Paginated {
            data: vec![1, 2],
            limit: 2,
            next_cursor: Some("abc".to_owned()),
        };
        let body = page_body(&req, page).expect("body");
        assert_eq!(
            body.links.next.as_deref(),
            Some("http://api.example.com/api/v1/notifications?unreadOnly=true&cursor=abc&limit=2")
        );
    }
}
