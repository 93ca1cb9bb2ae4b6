pub mod containerd;
pub mod control_plane;
pub mod firewall;
pub mod kernel_modules;
pub mod kube_packages;
pub mod ssh;
pub mod swap;
pub mod sysctl;
pub mod system;
pub mod worker;

pub use containerd::Containerd;
pub use control_plane::{AdminKubeconfig, KubeadmInit, PodNetwork, SaveJoinCommand};
pub use firewall::{Firewall, SshFirewall};
pub use kernel_modules::KernelModules;
pub use kube_packages::KubePackages;
pub use ssh::{SshdConfig, SshdRestart};
pub use swap::DisableSwap;
pub use sysctl::Sysctl;
pub use system::SystemPackages;
pub use worker::JoinCluster;
