use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, views::ProductView, ApiQuery, BaseUrl};
use crate::auth::{AdminUser, AuthUser};
use crate::domain::{NewProduct, Price, ProductPatch};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::ProductFilter;
use crate::uploads::ImageUpload;

const NOT_FOUND: &str = "Product not found";

/// Filters are only switched on by the literal string `true`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    featured: Option<String>,
    trending: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> ProductFilter {
        ProductFilter {
            featured: self.featured.as_deref() == Some("true"),
            trending: self.trending.as_deref() == Some("true"),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    BaseUrl(base): BaseUrl,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.catalog.list(query.filter()).await?;
    Ok(Json(products.iter().map(|p| ProductView::joined(p, &base)).collect()))
}

pub async fn get(State(state): State<AppState>, BaseUrl(base): BaseUrl, Path(id): Path<String>) -> Result<Json<ProductView>> {
    let product = state.catalog.get(parse_id(&id, NOT_FOUND)?).await?;
    Ok(Json(ProductView::joined(&product, &base)))
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    BaseUrl(base): BaseUrl,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ProductView>)> {
    let mut form = ProductForm::read(multipart).await?;
    let image = form.take_image()?;
    let created = state.catalog.create(form.into_new_product()?, image, &actor).await?;
    Ok((StatusCode::CREATED, Json(ProductView::joined(&created, &base))))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    BaseUrl(base): BaseUrl,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ProductView>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let mut form = ProductForm::read(multipart).await?;
    // Missing product and foreign ownership win over bad field values.
    state.catalog.editable(id, &actor).await?;
    let image = form.take_image()?;
    let patch = form.into_patch()?;
    let updated = state.catalog.update(id, patch, image, &actor).await?;
    Ok(Json(ProductView::joined(&updated, &base)))
}

pub async fn delete(State(state): State<AppState>, AuthUser(actor): AuthUser, Path(id): Path<String>) -> Result<Json<Value>> {
    state.catalog.delete(parse_id(&id, NOT_FOUND)?, &actor).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

/// Raw text fields and the optional `image` part of a product form. Nothing is
/// coerced or validated until the caller asks for it.
#[derive(Debug, Default)]
struct ProductForm {
    fields: HashMap<String, String>,
    image: Option<ImagePart>,
}

#[derive(Debug)]
struct ImagePart {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl ProductForm {
    async fn read(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Self> {
        let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else { continue };
            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.image = Some(ImagePart { file_name, content_type, bytes });
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }
        Ok(form)
    }

    fn take_image(&mut self) -> Result<Option<ImageUpload>> {
        let Some(part) = self.image.take() else { return Ok(None) };
        Ok(Some(ImageUpload::new(&part.file_name, part.content_type.as_deref(), part.bytes)?))
    }

    fn text(&self, key: &str) -> Option<&str> { self.fields.get(key).map(String::as_str) }

    /// Present and non-blank.
    fn filled(&self, key: &str) -> Option<&str> { self.text(key).map(str::trim).filter(|v| !v.is_empty()) }

    fn flag(&self, key: &str) -> Option<bool> { self.filled(key).map(|v| v == "true") }

    fn stock(&self) -> Result<Option<i32>> {
        self.filled("stock")
            .map(|raw| match raw.parse::<i32>() {
                Ok(n) if n >= 0 => Ok(n),
                _ => Err(AppError::Validation("Stock must be a non-negative integer".to_string())),
            })
            .transpose()
    }

    fn price(&self) -> Result<Option<Price>> {
        Ok(self.filled("price").map(Price::parse).transpose()?)
    }

    fn into_new_product(self) -> Result<NewProduct> {
        let name = self.filled("name").ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
        let price = self.price()?.ok_or_else(|| AppError::Validation("Price is required".to_string()))?;
        Ok(NewProduct {
            name: name.to_string(),
            price,
            description: self.text("description").unwrap_or_default().to_string(),
            category: self.text("category").unwrap_or_default().to_string(),
            stock: self.stock()?.unwrap_or(0),
            featured: self.flag("featured").unwrap_or(false),
            trending: self.flag("trending").unwrap_or(false),
        })
    }

    /// Blank numeric and flag fields are treated as absent; a blank name is rejected.
    fn into_patch(self) -> Result<ProductPatch> {
        let name = match self.text("name") {
            Some(raw) if raw.trim().is_empty() => return Err(AppError::Validation("Name cannot be empty".to_string())),
            Some(raw) => Some(raw.trim().to_string()),
            None => None,
        };
        Ok(ProductPatch {
            name,
            price: self.price()?,
            description: self.text("description").map(str::to_string),
            category: self.text("category").map(str::to_string),
            stock: self.stock()?,
            featured: self.flag("featured"),
            trending: self.flag("trending"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn form(pairs: &[(&str, &str)]) -> ProductForm {
        ProductForm {
            fields: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            image: None,
        }
    }

    #[test]
    fn test_new_product_defaults() {
        let p = form(&[("name", " Lamp "), ("price", "12.50")]).into_new_product().unwrap();
        assert_eq!(p.name, "Lamp");
        assert_eq!(p.price.amount(), Decimal::new(1250, 2));
        assert_eq!(p.stock, 0);
        assert!(!p.featured && !p.trending);
        assert_eq!(p.category, "");
    }

    #[test]
    fn test_new_product_requires_name_and_valid_price() {
        assert!(form(&[("price", "1")]).into_new_product().is_err());
        assert!(form(&[("name", "Lamp")]).into_new_product().is_err());
        assert!(form(&[("name", "Lamp"), ("price", "-1")]).into_new_product().is_err());
        assert!(form(&[("name", "Lamp"), ("price", "abc")]).into_new_product().is_err());
        assert!(form(&[("name", "Lamp"), ("price", "1"), ("stock", "-2")]).into_new_product().is_err());
    }

    #[test]
    fn test_flags_only_true_for_literal_true() {
        let p = form(&[("name", "Lamp"), ("price", "1"), ("featured", "true"), ("trending", "yes")])
            .into_new_product()
            .unwrap();
        assert!(p.featured);
        assert!(!p.trending);
    }

    #[test]
    fn test_patch_skips_blank_fields() {
        let patch = form(&[("price", ""), ("stock", ""), ("featured", "false"), ("description", "")]).into_patch().unwrap();
        assert_eq!(patch.price, None);
        assert_eq!(patch.stock, None);
        assert_eq!(patch.featured, Some(false));
        assert_eq!(patch.trending, None);
        assert_eq!(patch.description, Some(String::new()));

        assert!(form(&[("name", "  ")]).into_patch().is_err());
    }

    #[test]
    fn test_image_is_validated_on_demand() {
        let mut f = form(&[]);
        f.image = Some(ImagePart { file_name: "notes.txt".into(), content_type: Some("text/plain".into()), bytes: Bytes::new() });
        assert!(f.take_image().is_err());
        assert!(f.take_image().unwrap().is_none());
    }

    #[test]
    fn test_list_query_filter() {
        let q = ListQuery { featured: Some("true".into()), trending: Some("1".into()) };
        assert_eq!(q.filter(), ProductFilter { featured: true, trending: false });
    }
}
