//! Entry point exported by transport plugin modules
//!
//! A plugin module is a dynamic library exporting one function named
//! [`CHANNEL_MODULE_SYMBOL`] with the [`ChannelModuleEntry`] signature. It
//! returns one factory per concrete channel type the module provides, in
//! declaration order. Use [`export_channels!`](crate::export_channels) rather
//! than writing the function by hand.
//!
//! Host and plugins must be built with the same compiler and the same version
//! of this crate; the entry point uses the Rust ABI.
//!
//! Nothing exported by a module may unwind into the host. The macro wraps the
//! entry point in `catch_unwind` and every channel in a
//! [`GuardedChannel`](crate::GuardedChannel), so a failing plugin surfaces as
//! an error instead of aborting the host process.

use crate::channel::CommunicationChannel;
use crate::error::ChannelResult;

/// Constructs a fresh channel instance
pub type ChannelFactory = fn() -> ChannelResult<Box<dyn CommunicationChannel>>;

/// Signature of the module entry point
pub type ChannelModuleEntry = fn() -> Vec<ChannelFactory>;

/// Symbol name of the module entry point
pub const CHANNEL_MODULE_SYMBOL: &[u8] = b"plugfy_channel_module";

/// Export the channel types of a plugin module.
///
/// Every listed type must implement [`CommunicationChannel`] and `Default`.
///
/// ```rust,ignore
/// plugfy_channel::export_channels!(StdioChannel, LoopbackChannel);
/// ```
#[macro_export]
macro_rules! export_channels {
    ($($channel:ty),+ $(,)?) => {
        #[no_mangle]
        pub fn plugfy_channel_module() -> ::std::vec::Vec<$crate::ChannelFactory> {
            ::std::panic::catch_unwind(|| {
                ::std::vec![$(
                    $crate::GuardedChannel::<$channel>::create as $crate::ChannelFactory
                ),+]
            })
            .unwrap_or_default()
        }
    };
}
