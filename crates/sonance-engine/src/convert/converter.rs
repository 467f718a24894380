//! The chain that matches an arbitrary reader to a device's specs.

use sonance_core::{DeviceSpecs, ReadResult, Reader, Result, Specs};

use crate::convert::resampler::ResampleReader;
use crate::fx::RechannelReader;

/// Adapts a reader to a target [`DeviceSpecs`]: channel rematrixing first,
/// then sample-rate conversion. Sample-format packing is applied by the
/// device when it fills backend buffers (see [`crate::convert::format`]).
pub struct ConverterReader {
    inner: Box<dyn Reader>,
    target: DeviceSpecs,
}

impl ConverterReader {
    pub fn new(reader: Box<dyn Reader>, target: DeviceSpecs) -> Result<Self> {
        let specs = reader.specs().validate()?;
        Specs::new(target.rate, target.layout).validate()?;

        let mut inner = reader;
        if specs.layout != target.layout {
            inner = Box::new(RechannelReader::new(inner, target.layout));
        }
        if inner.specs().rate != target.rate {
            inner = Box::new(ResampleReader::new(inner, target.rate)?);
        }
        Ok(Self { inner, target })
    }

    pub fn device_specs(&self) -> DeviceSpecs {
        self.target
    }
}

impl Reader for ConverterReader {
    fn specs(&self) -> Specs {
        self.target.specs()
    }

    fn length(&self) -> Option<u64> {
        self.inner.length()
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn seekable(&self) -> bool {
        self.inner.seekable()
    }

    fn seek(&mut self, frame: u64) -> bool {
        self.inner.seek(frame)
    }

    fn read(&mut self, out: &mut [f32]) -> ReadResult {
        self.inner.read(out)
    }
}
