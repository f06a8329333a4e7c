use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

/// Decode an audio file to mono f32 samples at `target_rate` Hz.
///
/// Channels are averaged. Sources at a different rate go through rubato's
/// FFT resampler.
pub fn decode_mono<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let shown = path.display();

    let file = std::fs::File::open(path).with_context(|| format!("cannot open recording {shown}"))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut format = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("{shown} is not a readable audio container"))?
        .format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow!("{shown} has no decodable audio track"))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("no codec for the audio track of {shown}"))?;

    let mut interleaved: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // end of stream
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => bail!("{shown} is a chained stream"),
            Err(e) => return Err(e).with_context(|| format!("reading packets of {shown}")),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // a damaged packet only loses its own samples
            Err(SymphoniaError::IoError(_) | SymphoniaError::DecodeError(_)) => continue,
            Err(SymphoniaError::ResetRequired) => bail!("{shown} changed stream layout mid-file"),
            Err(e) => return Err(e).with_context(|| format!("decoding {shown}")),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels.get_or_insert(spec.channels.count());

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    let (Some(sr_in), Some(ch_in)) = (sample_rate, channels) else {
        bail!("{shown} does not declare its sample rate or channel layout");
    };
    if interleaved.is_empty() {
        bail!("{shown} contains no samples");
    }

    let mono = downmix(interleaved, ch_in);
    if sr_in == target_rate {
        return Ok(mono);
    }

    tracing::debug!(from = sr_in, to = target_rate, "resampling {shown}");
    resample(&mono, sr_in as usize, target_rate as usize)
        .with_context(|| format!("resampling {shown} to {target_rate} Hz"))
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved;
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample(mono: &[f32], sr_in: usize, sr_out: usize) -> Result<Vec<f32>> {
    let chunk_size: usize = 1024;
    let sub_chunks: usize = 1;

    let mut resampler = Fft::<f32>::new(sr_in, sr_out, chunk_size, sub_chunks, 1, FixedSync::Input)
        .context("failed to construct FFT resampler")?;

    let input_len = mono.len();
    let out_len = resampler.process_all_needed_output_len(input_len);
    let mut out = vec![0.0f32; out_len];

    let input_adapter =
        InterleavedSlice::new(mono, 1, input_len).context("bad input adapter")?;
    let mut output_adapter =
        InterleavedSlice::new_mut(&mut out, 1, out_len).context("bad output adapter")?;

    let (_frames_read, frames_written) =
        resampler.process_all_into_buffer(&input_adapter, &mut output_adapter, input_len, None)?;

    out.truncate(frames_written);
    Ok(out)
}
