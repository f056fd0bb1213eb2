use crate::store::{Page, Paged};
use actix_web::HttpResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Leave request not found")]
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[schema(example = 42)]
    pub total: u64,
    #[schema(example = 5)]
    pub total_pages: u64,
}

impl Meta {
    pub fn new(total: u64, page: Page) -> Self {
        Self {
            total,
            total_pages: total.div_ceil(u64::from(page.per_page)),
        }
    }
}

/// `{ success, data?, error?: { message }, meta?: { total, totalPages } }`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: message.into(),
            }),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::success(data))
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(Envelope::success(data))
}

pub fn paged<T: Serialize>(result: Paged<T>, page: Page) -> HttpResponse {
    let meta = Meta::new(result.total, page);
    HttpResponse::Ok().json(Envelope::success(result.items).with_meta(meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_error_and_meta() {
        let v = serde_json::to_value(Envelope::success(json!({"id": 1}))).unwrap();
        assert_eq!(v, json!({"success": true, "data": {"id": 1}}));
    }

    #[test]
    fn failure_carries_message_only() {
        let v = serde_json::to_value(Envelope::<()>::failure("boom")).unwrap();
        assert_eq!(v, json!({"success": false, "error": {"message": "boom"}}));
    }

    #[test]
    fn meta_rounds_pages_up() {
        let page = Page::new(Some(1), Some(10));
        assert_eq!(Meta::new(0, page).total_pages, 0);
        assert_eq!(Meta::new(10, page).total_pages, 1);
        assert_eq!(Meta::new(11, page).total_pages, 2);
        let v = serde_json::to_value(Meta::new(11, page)).unwrap();
        assert_eq!(v, json!({"total": 11, "totalPages": 2}));
    }
}
