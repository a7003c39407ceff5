//! Screen routes and the back stack.

/// Arguments handed to the outfit screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OutfitRequest {
    pub temperature: i32,
    pub summary: String,
    pub feels_like: i32,
    pub hourly_temperatures: Vec<i32>,
    pub hourly_hours: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Onboarding,
    Temperature,
    Outfit(OutfitRequest),
    NewArea,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Onboarding => "onboarding",
            Route::Temperature => "temperature",
            Route::Outfit(_) => "outfit",
            Route::NewArea => "new_area",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: start,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    pub fn depth(&self) -> usize {
        self.history.len() + 1
    }

    pub fn push(&mut self, route: Route) {
        tracing::info!("Navigate to {}", route.name());
        let previous = std::mem::replace(&mut self.current, route);
        self.history.push(previous);
    }

    /// Replace the whole stack with `route` (Onboarding is not kept once the
    /// forecast screen is reached).
    pub fn reset_to(&mut self, route: Route) {
        tracing::info!("Navigate to {} (stack cleared)", route.name());
        self.history.clear();
        self.current = route;
    }

    /// Pop the current route. Returns `false` at the root.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }
}
