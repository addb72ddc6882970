use actix_files::NamedFile;
use actix_multipart::{Multipart, MultipartError};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::stream::StreamExt as _;
use log::debug;
use serde_json::json;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::cv::NewCv;
use crate::service::{CvService, FILE_FIELD};

/// Parsed `multipart/form-data` body of a CV submission.
#[derive(Default)]
struct CvForm {
    fields: NewCv,
    original_file_name: String,
    content: Vec<u8>,
}

fn map_multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed upload: {}", err))
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("CV not found".to_string()))
}

fn field_text(field_name: &str, data: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(data)
        .map_err(|_| AppError::BadRequest(format!("Field {} is not valid UTF-8", field_name)))
}

async fn read_form(payload: &mut Multipart, max_bytes: usize) -> Result<CvForm, AppError> {
    let mut form = CvForm::default();
    let mut seen_file = false;
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(map_multipart_error)?;
        let disposition = field.content_disposition();
        let field_name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(map_multipart_error)?;
            total += chunk.len();
            if total > max_bytes {
                return Err(AppError::BadRequest(format!("Upload exceeds {} bytes", max_bytes)));
            }
            data.extend_from_slice(&chunk);
        }

        match field_name.as_str() {
            "name" => form.fields.name = field_text(&field_name, data)?,
            "email" => form.fields.email = field_text(&field_name, data)?,
            "phone" => form.fields.phone = field_text(&field_name, data)?,
            // A part without a filename is a plain text field, not an upload.
            FILE_FIELD if !seen_file && file_name.is_some() => {
                seen_file = true;
                form.original_file_name = file_name.unwrap_or_default();
                form.content = data;
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(form)
}

pub async fn submit_cv(
    service: web::Data<CvService>,
    config: web::Data<Config>,
    mut payload: Multipart,
) -> Result<HttpResponse, actix_web::Error> {
    let form = read_form(&mut payload, config.max_upload_bytes).await?;

    let entry = web::block(move || {
        service.submit(form.fields, &form.original_file_name, &form.content)
    })
    .await??;

    Ok(HttpResponse::Created().json(entry))
}

pub async fn list_cvs(service: web::Data<CvService>) -> Result<HttpResponse, actix_web::Error> {
    Ok(HttpResponse::Ok().json(service.list()))
}

pub async fn get_cv(
    service: web::Data<CvService>,
    id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = parse_id(&id)?;
    Ok(HttpResponse::Ok().json(service.get(id)?))
}

pub async fn delete_cv(
    service: web::Data<CvService>,
    id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = parse_id(&id)?;
    web::block(move || service.delete(id)).await??;

    Ok(HttpResponse::Ok().json(json!({
        "message": "CV deleted successfully",
    })))
}

pub async fn download_cv_file(
    req: HttpRequest,
    service: web::Data<CvService>,
    file_name: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let path = service.resolve_path(&file_name)?;
    let file = NamedFile::open_async(&path)
        .await
        .map_err(|_| AppError::NotFound("File not found".to_string()))?;

    Ok(file.into_response(&req))
}
