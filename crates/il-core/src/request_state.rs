//! Load request state machine.
//!
//! Pure transition function for a single request's lifecycle. Once a request
//! reaches a terminal state no further transition is accepted, which is what
//! keeps the terminal callback from being delivered twice.

/// Request lifecycle state.
///
/// 请求生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    /// Built but not yet attached to a target.
    ///
    /// 已创建，尚未绑定目标。
    Created,
    /// Attached; the fetch is running in the background.
    ///
    /// 已绑定，后台加载中。
    Executing,
    /// The image was delivered to the target.
    ///
    /// 加载成功。
    Succeeded,
    /// The failure was delivered to the target.
    ///
    /// 加载失败。
    Failed,
    /// Cancelled before a terminal event was delivered.
    ///
    /// 已取消。
    Cancelled,
    /// The target already showed this source; nothing ran.
    ///
    /// 目标已加载，跳过。
    AlreadyLoaded,
    /// No source; only the placeholder was applied.
    ///
    /// 无来源，仅设置占位图。
    NoSource,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestState::Created | RequestState::Executing)
    }

    /// Apply `transition`, returning the next state or `None` if the
    /// transition is not allowed from `self`.
    pub fn apply(self, transition: RequestTransition) -> Option<RequestState> {
        use RequestState as S;
        use RequestTransition as T;

        match (self, transition) {
            (S::Created, T::Attach) => Some(S::Executing),
            (S::Created, T::ShortCircuit) => Some(S::AlreadyLoaded),
            (S::Created, T::NoSource) => Some(S::NoSource),
            (S::Executing, T::Succeed) => Some(S::Succeeded),
            (S::Executing, T::Fail) => Some(S::Failed),
            (S::Created | S::Executing, T::Cancel) => Some(S::Cancelled),
            _ => None,
        }
    }
}

/// Inputs that drive [`RequestState`].
///
/// 驱动请求状态的输入。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTransition {
    /// Attach to a target and start the fetch.
    Attach,
    /// Skip the fetch because the target already shows the source.
    ShortCircuit,
    /// The request carries no source.
    NoSource,
    Succeed,
    Fail,
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TRANSITIONS: [RequestTransition; 6] = [
        RequestTransition::Attach,
        RequestTransition::ShortCircuit,
        RequestTransition::NoSource,
        RequestTransition::Succeed,
        RequestTransition::Fail,
        RequestTransition::Cancel,
    ];

    #[test]
    fn attach_then_succeed() {
        let state = RequestState::Created
            .apply(RequestTransition::Attach)
            .and_then(|s| s.apply(RequestTransition::Succeed));
        assert_eq!(state, Some(RequestState::Succeeded));
    }

    #[test]
    fn cannot_succeed_without_attaching() {
        assert_eq!(RequestState::Created.apply(RequestTransition::Succeed), None);
        assert_eq!(RequestState::Created.apply(RequestTransition::Fail), None);
    }

    #[test]
    fn executing_can_be_cancelled() {
        assert_eq!(
            RequestState::Executing.apply(RequestTransition::Cancel),
            Some(RequestState::Cancelled)
        );
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        for state in [
            RequestState::Succeeded,
            RequestState::Failed,
            RequestState::Cancelled,
            RequestState::AlreadyLoaded,
            RequestState::NoSource,
        ] {
            assert!(state.is_terminal());
            for transition in ALL_TRANSITIONS {
                assert_eq!(state.apply(transition), None, "{state:?} + {transition:?}");
            }
        }
    }

    #[test]
    fn cancel_after_success_is_rejected() {
        let state = RequestState::Executing
            .apply(RequestTransition::Succeed)
            .and_then(|s| s.apply(RequestTransition::Cancel));
        assert_eq!(state, None);
    }
}
