use super::Viewport;

/// Turns a viewport's opaque platform token into the backend's native
/// window type.
///
/// Any `Fn(&Viewport) -> Option<W>` closure is a resolver.
pub trait NativeHandleResolver<W> {
    /// `None` when the window has no usable native surface yet.
    fn resolve(&self, viewport: &Viewport<'_>) -> Option<W>;
}

impl<W, F> NativeHandleResolver<W> for F
where
    F: Fn(&Viewport<'_>) -> Option<W>,
{
    fn resolve(&self, viewport: &Viewport<'_>) -> Option<W> {
        self(viewport)
    }
}

/// Resolver for hosts without native windows: every viewport stays
/// uninitialized.
#[derive(Debug, Copy, Clone, Default)]
pub struct Headless;

impl<W> NativeHandleResolver<W> for Headless {
    fn resolve(&self, _viewport: &Viewport<'_>) -> Option<W> {
        None
    }
}

/// Hands the platform token through unchanged, for backends whose native
/// window type is the token itself.
#[derive(Debug, Copy, Clone, Default)]
pub struct PassThrough;

impl NativeHandleResolver<u64> for PassThrough {
    fn resolve(&self, viewport: &Viewport<'_>) -> Option<u64> {
        viewport.platform_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::viewport::ViewportId;

    fn viewport(handle: Option<u64>) -> Viewport<'static> {
        Viewport::new(ViewportId(1), handle, Vec2::new(10.0, 10.0), 1.0)
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |vp: &Viewport<'_>| vp.platform_handle.map(|h| h * 2);
        assert_eq!(resolver.resolve(&viewport(Some(21))), Some(42));
        assert_eq!(resolver.resolve(&viewport(None)), None);
    }

    #[test]
    fn headless_never_resolves() {
        let resolved: Option<u64> = Headless.resolve(&viewport(Some(7)));
        assert_eq!(resolved, None);
    }
}
