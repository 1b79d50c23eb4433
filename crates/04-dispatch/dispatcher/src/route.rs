use crate::error::RouteError;
use sigil_model::{Pressure, SigilCategory, Tick};

/// What a routing handler sees for one admitted sigil.
#[derive(Clone, Copy, Debug)]
pub struct Invocation<'a> {
    pub sigil_id: &'a str,
    pub category: SigilCategory,
    pub house: &'a str,
    pub tick: Tick,
    pub coherence_score: f64,
    pub pressure: &'a Pressure,
}

/// Side-effect boundary invoked once per admitted sigil.
///
/// The dispatcher only cares whether routing succeeded. A failure aborts the
/// execution before any state is committed.
pub trait SigilRouter: Send {
    fn route(&mut self, invocation: &Invocation<'_>) -> Result<(), RouteError>;
}

impl<R: SigilRouter + ?Sized> SigilRouter for Box<R> {
    fn route(&mut self, invocation: &Invocation<'_>) -> Result<(), RouteError> {
        (**self).route(invocation)
    }
}

/// Accepts every invocation and does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRouter;

impl SigilRouter for NullRouter {
    fn route(&mut self, _invocation: &Invocation<'_>) -> Result<(), RouteError> {
        Ok(())
    }
}

/// Adapts a closure into a [`SigilRouter`].
pub struct FnRoute<F>(pub F);

impl<F> SigilRouter for FnRoute<F>
where
    F: FnMut(&Invocation<'_>) -> Result<(), RouteError> + Send,
{
    fn route(&mut self, invocation: &Invocation<'_>) -> Result<(), RouteError> {
        (self.0)(invocation)
    }
}

type Handler = Box<dyn SigilRouter>;

/// One handler slot per category.
///
/// Routing to a category without a handler is a [`RouteError`], so a missing
/// registration can never pass silently.
#[derive(Default)]
pub struct RouteTable {
    handlers: [Option<Handler>; SigilCategory::COUNT],
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handler` for `category`, replacing any previous one.
    pub fn on(mut self, category: SigilCategory, handler: impl SigilRouter + 'static) -> Self {
        self.set(category, handler);
        self
    }

    /// Installs a closure handler for `category`.
    pub fn on_fn<F>(self, category: SigilCategory, handler: F) -> Self
    where
        F: FnMut(&Invocation<'_>) -> Result<(), RouteError> + Send + 'static,
    {
        self.on(category, FnRoute(handler))
    }

    pub fn set(&mut self, category: SigilCategory, handler: impl SigilRouter + 'static) {
        self.handlers[category.index()] = Some(Box::new(handler));
    }

    pub fn handles(&self, category: SigilCategory) -> bool {
        self.handlers[category.index()].is_some()
    }
}

impl SigilRouter for RouteTable {
    fn route(&mut self, invocation: &Invocation<'_>) -> Result<(), RouteError> {
        match self.handlers[invocation.category.index()].as_mut() {
            Some(handler) => handler.route(invocation),
            None => Err(RouteError::new(format!(
                "no handler registered for {}",
                invocation.category
            ))),
        }
    }
}
