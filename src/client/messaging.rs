use crate::buffer::Buf;
use crate::error::Result;
use crate::protocol::FrameHeader;
use crate::types::{CommStatus, Rank, Source, Tag, TagMatch};

use super::Communicator;
use super::request::{CommRequest, stage_into};

/// Header and payload carrying every item of `buf`.
pub(crate) fn frame_for<B: Buf + ?Sized>(tag: Tag, buf: &B) -> (FrameHeader, Vec<u8>) {
    let payload = buf.pack();
    let header = FrameHeader::data(tag, buf.data_type() as u8, buf.len(), payload.len());
    (header, payload)
}

impl Communicator {
    /// Send every item of `buf` to `to` under `tag`.
    ///
    /// Returns once the message has been written to the channel, which does
    /// not imply the receiver has consumed it.
    pub async fn send<B: Buf + ?Sized>(&self, to: Rank, tag: Tag, buf: &B) -> Result<()> {
        self.send_nb(to, tag, buf).await?.wait().await?;
        Ok(())
    }

    /// Non-blocking [`send`](Self::send).
    ///
    /// The buffer's contents are captured before this returns, so the buffer
    /// may be reused immediately.
    pub async fn send_nb<B: Buf + ?Sized>(
        &self,
        to: Rank,
        tag: Tag,
        buf: &B,
    ) -> Result<CommRequest<'static>> {
        self.check_rank(to)?;
        let (header, payload) = frame_for(tag, buf);
        let channel = self.inner.channel(to).await?;
        Ok(CommRequest::for_send(channel.send(header, payload)))
    }

    /// Receive one message matching `from` and `tag` into `buf`.
    ///
    /// A message shorter than `buf` leaves the remaining items untouched; a
    /// longer one is truncated. The status reports the sender, the tag and the
    /// item count as sent. Which of several matching messages a wildcard or
    /// range receive picks is unspecified.
    pub async fn receive<B: Buf + ?Sized>(
        &self,
        from: impl Into<Source>,
        tag: impl Into<TagMatch>,
        buf: &mut B,
    ) -> Result<CommStatus> {
        self.receive_nb(from, tag, buf).await?.wait_received().await
    }

    /// Non-blocking [`receive`](Self::receive).
    ///
    /// A wildcard source first makes sure a channel from every rank can
    /// exist, so the receive can be satisfied by any of them.
    pub async fn receive_nb<'a, B: Buf + ?Sized>(
        &self,
        from: impl Into<Source>,
        tag: impl Into<TagMatch>,
        buf: &'a mut B,
    ) -> Result<CommRequest<'a>> {
        let source = from.into();
        let tag = tag.into();
        match source {
            Source::Rank(rank) => {
                self.check_rank(rank)?;
                self.inner.channel(rank).await?;
            }
            Source::Any => {
                for peer in 0..self.size() {
                    self.inner.ensure_channel(peer).await?;
                }
            }
        }
        let delivery = self.inner.group.mailbox().post(source, tag)?;
        Ok(CommRequest::for_receive(delivery, stage_into(buf)))
    }

    /// Send `send_buf` to `to` while receiving from `from` into `recv_buf`.
    ///
    /// `to` and `from` may both be this rank.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_receive<S: Buf + ?Sized, R: Buf + ?Sized>(
        &self,
        to: Rank,
        send_tag: Tag,
        send_buf: &S,
        from: Rank,
        recv_tag: impl Into<TagMatch>,
        recv_buf: &mut R,
    ) -> Result<CommStatus> {
        self.send_receive_nb(to, send_tag, send_buf, from, recv_tag, recv_buf)
            .await?
            .wait_received()
            .await
    }

    /// Non-blocking [`send_receive`](Self::send_receive).
    pub async fn send_receive_nb<'a, S: Buf + ?Sized, R: Buf + ?Sized>(
        &self,
        to: Rank,
        send_tag: Tag,
        send_buf: &S,
        from: Rank,
        recv_tag: impl Into<TagMatch>,
        recv_buf: &'a mut R,
    ) -> Result<CommRequest<'a>> {
        self.check_rank(to)?;
        self.check_rank(from)?;
        let (header, payload) = frame_for(send_tag, send_buf);
        let channel = self.inner.channel(to).await?;
        let request = self.receive_nb(from, recv_tag, recv_buf).await?;
        Ok(request.with_send(channel.send(header, payload)))
    }
}
