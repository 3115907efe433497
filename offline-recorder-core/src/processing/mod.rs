pub mod audio_mixer;
pub mod dsp;
pub mod encoder_sink;
