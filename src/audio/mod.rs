pub mod backend;
pub mod clip;
pub mod device;
pub mod file;
pub mod wav;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, FileBackend};
pub use clip::{ClipMetadata, ClipWriter};
pub use device::{AudioDevice, DeviceError, RecordingHandle, RecordingStatus, StoppedRecording};
pub use file::AudioFile;
pub use wav::{WavAudioDevice, WavDeviceConfig};
