// web-server/src/static_files.rs
use actix_files::Files;
use actix_web::{http::header, middleware::DefaultHeaders, web};
use common::{CacheConfig, StaticFilesConfig};

/// Cache-Control value for the configured cache policy
pub fn cache_control(cache: &CacheConfig) -> String {
    let mut value = format!("public, max-age={}", cache.max_age);
    if cache.immutable {
        value.push_str(", immutable");
    }
    if cache.must_revalidate {
        value.push_str(", must-revalidate");
    }
    value
}

/// Serve the browser-side scripts and styles under `/static`
pub fn configure(cfg: &mut web::ServiceConfig, config: &StaticFilesConfig) {
    cfg.service(
        web::scope("/static")
            .wrap(DefaultHeaders::new().add((header::CACHE_CONTROL, cache_control(&config.cache))))
            .service(
                Files::new("", &config.path)
                    .prefer_utf8(true)
                    .use_etag(true)
                    .use_last_modified(true),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_control() {
        let cache = CacheConfig { max_age: 3600, immutable: false, must_revalidate: true };
        assert_eq!(cache_control(&cache), "public, max-age=3600, must-revalidate");

        let cache = CacheConfig { max_age: 60, immutable: true, must_revalidate: false };
        assert_eq!(cache_control(&cache), "public, max-age=60, immutable");
    }
}
