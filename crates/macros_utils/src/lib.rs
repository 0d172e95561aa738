//! Small declarative helpers shared by the HTTP apps.

#[cfg(feature = "actix")]
#[doc(hidden)]
pub use actix_web as __actix;

/// Generates a `pub fn routes(cfg: &mut ServiceConfig)` registering every
/// listed handler, so a route module only has to name its handlers.
///
/// ```ignore
/// macros_utils::routes! {
///     route health_route,
///     route list_links,
/// }
/// ```
#[cfg(feature = "actix")]
#[macro_export]
macro_rules! routes {
    ($(route $handler:ident),* $(,)?) => {
        pub fn routes(cfg: &mut $crate::__actix::web::ServiceConfig) {
            $( cfg.service($handler); )*
        }
    };
}
