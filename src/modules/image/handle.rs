use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, delete, get, put, web};
use futures_util::TryStreamExt;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::image::{
        model::{ImageResponse, resolve_mime},
        repository_pg::ImageRepositoryPg,
        service::ImageService,
    },
};

pub type ImageSvc = ImageService<ImageRepositoryPg>;

#[get("")]
pub async fn list_images(
    image_service: web::Data<ImageSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<ImageResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let images = image_service.list(user_id).await?;
    Ok(success::Success::ok(Some(images)).message("Images retrieved successfully"))
}

#[put("/{slot}")]
pub async fn upload_image(
    image_service: web::Data<ImageSvc>,
    slot: web::Path<i16>,
    mut payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<ImageResponse>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let max_size = image_service.max_file_size();

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let Some(filename) =
            field.content_disposition().and_then(|cd| cd.get_filename()).map(str::to_string)
        else {
            // plain form fields are ignored
            continue;
        };

        let declared = field.content_type().map(|m| m.essence_str().to_string());
        let mime_type = resolve_mime(declared.as_deref(), &filename);

        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_size {
                return Err(error::Error::bad_request(format!(
                    "File size exceeds maximum allowed size of {max_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        let image =
            image_service.upload(user_id, slot.into_inner(), &filename, bytes, mime_type).await?;

        return Ok(success::Success::ok(Some(image)).message("Image uploaded successfully"));
    }

    Err(error::Error::bad_request("No file found in request"))
}

#[delete("/{slot}")]
pub async fn delete_image(
    image_service: web::Data<ImageSvc>,
    slot: web::Path<i16>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    image_service.delete(user_id, slot.into_inner()).await?;
    Ok(success::Success::no_content())
}

/// Public files under `MEDIA_BASE_URL`; registered by path in `main`.
pub async fn serve_media(
    image_service: web::Data<ImageSvc>,
    filename: web::Path<String>,
) -> Result<HttpResponse, error::Error> {
    let (bytes, mime) = image_service.read_media(&filename).await?;
    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header(("Cache-Control", "public, max-age=86400"))
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .body(bytes))
}
