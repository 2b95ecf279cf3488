mod demo;

#[cfg(feature = "docker")]
mod docker;

pub use demo::DemoRuntime;

#[cfg(feature = "docker")]
pub use docker::DockerRuntime;
