pub use enclose::enclose;

/// Creates an [`Effect`](crate::Effect), cloning the listed handles into it.
///
/// ```ignore
/// let _log = effect!(runtime, (state) => println!("{:?}", state.get_int("a")));
/// ```
#[macro_export]
macro_rules! effect {
    ($rt:expr, ( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::Effect::new(&$rt, $crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
    };
    ($rt:expr => $($b:tt)*) => {
        $crate::Effect::new(&$rt, move || { $($b)* })
    };
}

/// Creates a [`Computed`](crate::Computed), cloning the listed handles into it.
#[macro_export]
macro_rules! computed {
    ($rt:expr, ( $($d_tt:tt)* ) => $($b:tt)*) => {
        $crate::Computed::new(&$rt, $crate::macros::enclose!(($( $d_tt )*) move || { $($b)* }))
    };
    ($rt:expr => $($b:tt)*) => {
        $crate::Computed::new(&$rt, move || { $($b)* })
    };
}
