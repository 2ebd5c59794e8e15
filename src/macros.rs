/// Generates the capability trait impl for both reference types.
///
/// List the trait's methods once; each generated method revalidates and then
/// forwards through `with` or `with_mut` according to its receiver. Method
/// arguments must be plain identifiers, return types must be owned values,
/// and the trait name must be in scope at the call site. Hand-written impls
/// remain the escape hatch for traits outside those bounds.
///
/// # Examples
///
/// ```
/// use eternalref::{EternalEntity, EternalRef, InMemoryRegistry, eternal_forward};
///
/// #[derive(Clone)]
/// struct Ghost {
///     name: String,
///     haunting: bool,
/// }
///
/// impl EternalEntity for Ghost {
///     type Id = String;
///
///     fn persist_id(&self) -> String {
///         self.name.clone()
///     }
///
///     fn is_valid(&self) -> bool {
///         self.haunting
///     }
/// }
///
/// trait Spook: EternalEntity {
///     fn wail(&self) -> String;
///     fn calm(&mut self, amount: u32) -> u32;
/// }
///
/// impl Spook for Ghost {
///     fn wail(&self) -> String {
///         format!("oooo from {}", self.name)
///     }
///
///     fn calm(&mut self, amount: u32) -> u32 {
///         amount
///     }
/// }
///
/// eternal_forward! {
///     impl Spook {
///         fn wail(&self) -> String;
///         fn calm(&mut self, amount: u32) -> u32;
///     }
/// }
///
/// let town = InMemoryRegistry::new();
/// let mut reference = EternalRef::wrap(
///     Ghost { name: "casper".into(), haunting: true },
///     &town,
/// );
///
/// assert_eq!(reference.wail(), "oooo from casper");
/// assert_eq!(reference.calm(3), 3);
/// ```
#[macro_export]
macro_rules! eternal_forward {
    (impl $cap:ident { $($methods:tt)* }) => {
        impl<E, R> $cap for $crate::EternalRef<E, R>
        where
            E: $cap + $crate::EternalEntity,
            R: $crate::EntityRegistry<E>,
        {
            $crate::__eternal_forward_methods! { $($methods)* }
        }

        impl<E, R> $cap for $crate::SyncEternalRef<E, R>
        where
            E: $cap + $crate::EternalEntity,
            R: $crate::EntityRegistry<E>,
        {
            $crate::__eternal_forward_methods! { $($methods)* }
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __eternal_forward_methods {
    () => {};
    (fn $method:ident(&self $(, $arg:ident: $arg_ty:ty)*) $(-> $ret:ty)?; $($rest:tt)*) => {
        fn $method(&self $(, $arg: $arg_ty)*) $(-> $ret)? {
            self.with(|entity| entity.$method($($arg),*))
        }

        $crate::__eternal_forward_methods! { $($rest)* }
    };
    (fn $method:ident(&mut self $(, $arg:ident: $arg_ty:ty)*) $(-> $ret:ty)?; $($rest:tt)*) => {
        fn $method(&mut self $(, $arg: $arg_ty)*) $(-> $ret)? {
            self.with_mut(|entity| entity.$method($($arg),*))
        }

        $crate::__eternal_forward_methods! { $($rest)* }
    };
}
