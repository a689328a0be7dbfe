/// Validates avatar URLs coming from the identity provider.
///
/// Returns the accepted URL or `None`; never fails.
pub trait AvatarSanitizer: Send + Sync {
    fn sanitize(&self, raw: Option<&str>) -> Option<String>;
}
