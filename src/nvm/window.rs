use crate::nvm::{
    NvmError,
    bus::BusArbiter,
    controller::NvmController,
    driver::BufferedNvm,
    helpers::{page_offset, page_start},
    types::{Dest, Src},
};

/// Where one step writes to.
enum DstWindow<'a> {
    /// Offset into the page buffer.
    Buffer(usize),
    Ram(&'a mut [u8]),
}

/// Where one step reads from.
enum SrcWindow<'a> {
    /// Offset into the page buffer.
    Buffer(usize),
    /// Flash outside the bound page, read directly.
    Flash(u32),
    Ram(&'a [u8]),
    Fill(u8),
}

impl<C, B, const PS: usize, const RS: usize> BufferedNvm<C, B, PS, RS>
where
    C: NvmController,
    B: BusArbiter,
{
    /// Moves up to `len` bytes from `src` to `dst` and returns how many were moved.
    ///
    /// An NVM destination is redirected into the page buffer (binding its page first, which
    /// may commit the previously bound page), so a step never crosses the end of that page.
    /// An NVM source is read from the buffer when it lies in the bound page; a source that
    /// lies before the bound page stops at its start so a later step sees the buffered data
    /// rather than stale flash. Source and destination may overlap inside the buffer.
    ///
    /// Callers loop until the whole range is moved; see [`Self::memcpy_buffered`].
    pub fn write_to_buffered_page(
        &mut self,
        dst: Dest<'_>,
        src: Src<'_>,
        len: usize,
    ) -> Result<usize, NvmError> {
        if len == 0 {
            return Err(NvmError::ZeroLength);
        }
        match &dst {
            Dest::Ram(out) if out.len() < len => return Err(NvmError::OutOfBounds),
            _ => {}
        }
        match src {
            Src::Ram(data) if data.len() < len => return Err(NvmError::OutOfBounds),
            Src::Nvm(addr) if !self.region.contains(addr) => return Err(NvmError::InvalidAddress),
            _ => {}
        }

        let (dst_window, dst_capacity) = match dst {
            Dest::Nvm(addr) => {
                self.rebuffer(addr)?;
                let offset = page_offset::<PS>(addr);
                (DstWindow::Buffer(offset), PS - offset)
            }
            Dest::Ram(out) => (DstWindow::Ram(out), len),
        };

        let (src_window, src_extent) = match src {
            Src::Nvm(addr) => self.source_window(addr),
            Src::Ram(data) => (SrcWindow::Ram(data), len),
            Src::Fill(value) => (SrcWindow::Fill(value), len),
        };

        let n = len.min(dst_capacity).min(src_extent);
        self.move_bytes(dst_window, src_window, n);

        log::trace!("moved {} of {} bytes", n, len);
        Ok(n)
    }

    fn source_window(&self, addr: u32) -> (SrcWindow<'static>, usize) {
        // Reads outside the buffer must stay inside the region
        let to_region_end = (self.region.base() + self.region.len() - addr) as usize;

        match self.cache.bound() {
            Some(page) if page_start::<PS>(addr) == page => {
                let offset = page_offset::<PS>(addr);
                (SrcWindow::Buffer(offset), PS - offset)
            }
            Some(page) if addr < page => (SrcWindow::Flash(addr), (page - addr) as usize),
            _ => (SrcWindow::Flash(addr), to_region_end),
        }
    }

    fn move_bytes(&mut self, dst: DstWindow<'_>, src: SrcWindow<'_>, n: usize) {
        let buffer = self.cache.buffer_mut();
        let controller = &mut self.programmer.controller;

        match dst {
            DstWindow::Buffer(d) => {
                let out = d..d + n;
                match src {
                    // Only case where the windows can alias
                    SrcWindow::Buffer(s) => buffer.copy_within(s..s + n, d),
                    SrcWindow::Flash(addr) => controller.read(addr, &mut buffer[out]),
                    SrcWindow::Ram(data) => buffer[out].copy_from_slice(&data[..n]),
                    SrcWindow::Fill(value) => buffer[out].fill(value),
                }
            }
            DstWindow::Ram(out) => {
                let out = &mut out[..n];
                match src {
                    SrcWindow::Buffer(s) => out.copy_from_slice(&buffer[s..s + n]),
                    SrcWindow::Flash(addr) => controller.read(addr, out),
                    SrcWindow::Ram(data) => out.copy_from_slice(&data[..n]),
                    SrcWindow::Fill(value) => out.fill(value),
                }
            }
        }
    }
}
