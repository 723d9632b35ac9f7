//! Macros for ergonomic state declaration.

/// Implement [`Construct`](crate::core::Construct) for states that take no
/// construction parameters and start from `Default`.
///
/// The implementation is generic over the context type, so it applies to
/// whatever contexts the state implements [`State`](crate::core::State) for.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::State;
/// use hsm_engine::leaf_state;
///
/// #[derive(Default)]
/// struct Idle;
/// #[derive(Default)]
/// struct Charging {
///     percent: u8,
/// }
///
/// impl State for Idle {}
/// impl State for Charging {}
///
/// leaf_state!(Idle, Charging);
/// ```
#[macro_export]
macro_rules! leaf_state {
    ($($state:ty),+ $(,)?) => {
        $(
            impl<C: 'static> $crate::core::Construct<C> for $state
            where
                $state: $crate::core::State<C> + ::std::default::Default,
            {
                type Config = ();

                fn construct(_machine: &$crate::machine::MachineRef<C>, _config: ()) -> Self {
                    <$state as ::std::default::Default>::default()
                }
            }
        )+
    };
}
