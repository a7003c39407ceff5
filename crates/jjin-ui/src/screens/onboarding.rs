use super::Command;
use crate::navigation::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    NotRequested,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingView {
    pub permission: PermissionState,
    pub first_launch: bool,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct OnboardingScreen {
    permission: PermissionState,
    first_launch: bool,
}

impl OnboardingScreen {
    pub fn new(first_launch: bool, permission_granted: bool) -> Self {
        let permission = if permission_granted {
            PermissionState::Granted
        } else {
            PermissionState::NotRequested
        };
        Self {
            permission,
            first_launch,
        }
    }

    /// Returning users who already granted location go straight to the
    /// forecast.
    pub fn should_skip(&self) -> bool {
        !self.first_launch && self.permission == PermissionState::Granted
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn on_permission_result(&mut self, granted: bool) -> Vec<Command> {
        if !granted {
            tracing::warn!("Location permission denied");
            self.permission = PermissionState::Denied;
            return Vec::new();
        }

        tracing::info!("Location permission granted");
        self.permission = PermissionState::Granted;

        let mut commands = Vec::with_capacity(2);
        if self.first_launch {
            self.first_launch = false;
            commands.push(Command::CompleteFirstLaunch);
        }
        commands.push(Command::ResetTo(Route::Temperature));
        commands
    }

    pub fn view(&self) -> OnboardingView {
        let message = match self.permission {
            PermissionState::NotRequested => {
                "JJin Weather needs your location to show the forecast where you are."
            }
            PermissionState::Granted => "Location access granted.",
            PermissionState::Denied => {
                "Location access was denied. Allow it to see the weather for where you are."
            }
        };
        OnboardingView {
            permission: self.permission,
            first_launch: self.first_launch,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_grant_completes_first_launch() {
        let mut screen = OnboardingScreen::new(true, false);
        assert!(!screen.should_skip());

        let commands = screen.on_permission_result(true);
        assert!(matches!(commands[0], Command::CompleteFirstLaunch));
        assert!(matches!(commands[1], Command::ResetTo(Route::Temperature)));
        assert_eq!(screen.permission(), PermissionState::Granted);
        assert!(!screen.view().first_launch);
    }

    #[test]
    fn test_denial_stays_put() {
        let mut screen = OnboardingScreen::new(true, false);
        assert!(screen.on_permission_result(false).is_empty());
        assert_eq!(screen.view().permission, PermissionState::Denied);
    }

    #[test]
    fn test_returning_user_skips() {
        assert!(OnboardingScreen::new(false, true).should_skip());
        assert!(!OnboardingScreen::new(false, false).should_skip());
        assert!(!OnboardingScreen::new(true, true).should_skip());
    }

    #[test]
    fn test_regrant_after_first_launch_only_navigates() {
        let mut screen = OnboardingScreen::new(false, false);
        let commands = screen.on_permission_result(true);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::ResetTo(Route::Temperature)));
    }
}
