//! Registration macros.

/// Implements [`Contract`](crate::Contract) for a trait-object type and
/// submits its declaration for [`ProviderRegistry::collected`](crate::ProviderRegistry::collected).
///
/// ```ignore
/// pub trait ManualService { fn describe(&self) -> String; }
/// spiloader_core::declare_contract!(dyn ManualService, "example.Service");
/// ```
#[macro_export]
macro_rules! declare_contract {
    ($contract:ty, $name:literal) => {
        impl $crate::Contract for $contract {
            const NAME: &'static str = $name;
        }

        $crate::inventory::submit! {
            $crate::ContractEntry::of::<$contract>()
        }
    };
}

/// Submits an infallible zero-argument provider constructor.
///
/// `$construct` is any expression callable with no arguments whose result
/// coerces into `Box<$contract>`.
#[macro_export]
macro_rules! submit_provider {
    ($contract:ty, $provider:literal, $construct:expr) => {
        const _: () = {
            fn construct() -> ::std::result::Result<$crate::ErasedInstance, ::std::string::String>
            {
                let instance: ::std::boxed::Box<$contract> = ::std::boxed::Box::new(($construct)());
                ::std::result::Result::Ok($crate::erase::<$contract>(instance))
            }

            $crate::inventory::submit! {
                $crate::ProviderEntry::new(
                    <$contract as $crate::Contract>::NAME,
                    $provider,
                    ::std::module_path!(),
                    construct,
                )
            }
        };
    };
}

/// Submits a provider constructor returning `Result<T, E>` with `E: Display`.
#[macro_export]
macro_rules! submit_fallible_provider {
    ($contract:ty, $provider:literal, $construct:expr) => {
        const _: () = {
            fn construct() -> ::std::result::Result<$crate::ErasedInstance, ::std::string::String>
            {
                let value = ($construct)().map_err(|err| ::std::string::ToString::to_string(&err))?;
                let instance: ::std::boxed::Box<$contract> = ::std::boxed::Box::new(value);
                ::std::result::Result::Ok($crate::erase::<$contract>(instance))
            }

            $crate::inventory::submit! {
                $crate::ProviderEntry::new(
                    <$contract as $crate::Contract>::NAME,
                    $provider,
                    ::std::module_path!(),
                    construct,
                )
            }
        };
    };
}
