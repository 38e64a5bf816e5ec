//! Reading image uploads out of multipart bodies.

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;

use crate::error::AppError;

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
    pub filename: String,
}

impl UploadItem {
    /// Storage key `{prefix}/{id}.{ext}`.
    pub fn key(&self, prefix: &str, id: &str) -> String {
        let ext = ext_from_mime(&self.content_type).unwrap_or("bin");
        format!("{prefix}/{id}.{ext}")
    }
}

/// A multipart body split into its image field and its text fields.
#[derive(Debug, Default)]
pub struct ImageForm {
    pub image: Option<UploadItem>,
    pub fields: HashMap<String, String>,
}

impl ImageForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require_image(&mut self) -> Result<UploadItem, AppError> {
        self.image
            .take()
            .ok_or_else(|| AppError::BadRequest("image file is required".into()))
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

pub fn check_image(item: &UploadItem) -> Result<(), AppError> {
    if !item.content_type.starts_with("image/") {
        return Err(AppError::BadRequest("only image files are allowed".into()));
    }
    if item.body.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(
            "image size must be less than 10 MB".into(),
        ));
    }
    Ok(())
}

/// Drain a multipart body. The field named `image` is validated as an
/// upload; every other field is kept as text.
pub async fn read_image_form(mut mp: Multipart) -> Result<ImageForm, AppError> {
    let mut form = ImageForm::default();
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let filename = field.file_name().unwrap_or("upload").to_string();
            let body = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid image field: {e}")))?;
            let item = UploadItem {
                body,
                content_type,
                filename,
            };
            check_image(&item)?;
            form.image = Some(item);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("invalid field {name}: {e}")))?;
            form.fields.insert(name, value);
        }
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(content_type: &str, size: usize) -> UploadItem {
        UploadItem {
            body: Bytes::from(vec![0u8; size]),
            content_type: content_type.into(),
            filename: "x".into(),
        }
    }

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn keys_fall_back_to_bin() {
        assert_eq!(item("image/png", 1).key("articles", "a1"), "articles/a1.png");
        assert_eq!(item("image/gif", 1).key("user-logs/u1", "l1"), "user-logs/u1/l1.bin");
    }

    #[test]
    fn rejects_non_images_and_oversized_uploads() {
        assert!(check_image(&item("image/png", 10)).is_ok());
        assert_eq!(
            check_image(&item("text/plain", 10)).unwrap_err().to_string(),
            "only image files are allowed"
        );
        assert!(check_image(&item("image/png", MAX_IMAGE_BYTES + 1)).is_err());
    }
}
