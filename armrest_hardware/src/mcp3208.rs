//! MCP3208 12-bit SPI ADC front end (Raspberry Pi, via rppal).
use armrest_traits::{AnalogFrontEnd, Channel};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};

const SPI_CLOCK_HZ: u32 = 1_000_000;

/// Which ADC input each load cell is wired to.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMap {
    pub left: u8,
    pub right: u8,
    pub vtc: u8,
}

impl ChannelMap {
    fn adc_input(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Left => self.left,
            Channel::Right => self.right,
            Channel::Vtc => self.vtc,
        }
    }
}

pub struct Mcp3208 {
    spi: Spi,
    map: ChannelMap,
}

impl Mcp3208 {
    pub fn open(bus: u8, slave_select: u8, map: ChannelMap) -> Result<Self> {
        for input in [map.left, map.right, map.vtc] {
            if input > 7 {
                return Err(HwError::ChannelOutOfRange(input));
            }
        }
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => return Err(HwError::Spi(format!("unsupported spi bus {other}"))),
        };
        let ss = match slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("unsupported slave select {other}"))),
        };
        let spi = Spi::new(bus, ss, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self { spi, map })
    }

    /// Single-ended conversion on `input` (0..=7).
    pub fn read_input(&mut self, input: u8) -> Result<u16> {
        // start bit + single-ended + D2 in the first byte, D1/D0 in the top of the second
        let tx = [0x06 | ((input >> 2) & 0x01), (input & 0x03) << 6, 0x00];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let counts = (u16::from(rx[1] & 0x0F) << 8) | u16::from(rx[2]);
        trace!(input, counts, "mcp3208 read");
        Ok(counts)
    }
}

impl AnalogFrontEnd for Mcp3208 {
    fn read_counts(
        &mut self,
        channel: Channel,
    ) -> std::result::Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let input = self.map.adc_input(channel);
        Ok(self.read_input(input)?)
    }
}
