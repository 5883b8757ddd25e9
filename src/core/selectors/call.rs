//! Call-surface selectors: rosters, the video gallery, the control bar
//! buttons and the compliance flags feeding the banner.

use std::sync::Arc;

use serde::Serialize;

use super::{ComponentId, ComponentProps, Memo, ParticipantItem, ParticipantListProps};
use crate::core::context::RenderContext;
use crate::core::identity::flatten;
use crate::core::snapshot::{
    CallState, DeviceState, LocalParticipant, MediaStreamKind, Participant, RenderTarget,
    SessionState, VideoStream,
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StreamView {
    pub id: u32,
    pub is_available: bool,
    pub render_target: Option<RenderTarget>,
}

impl StreamView {
    fn from_stream(stream: &VideoStream) -> Self {
        Self {
            id: stream.id,
            is_available: stream.is_available,
            render_target: stream.render_target().cloned(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LocalTile {
    pub user_id: String,
    pub display_name: String,
    pub is_muted: bool,
    pub is_screen_sharing_on: bool,
    /// True once the camera preview's render target exists.
    pub video_available: bool,
    pub render_target: Option<RenderTarget>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RemoteTile {
    pub user_id: String,
    pub display_name: String,
    pub is_muted: bool,
    pub is_speaking: bool,
    pub is_screen_sharing: bool,
    pub video: Option<StreamView>,
    pub screen_share: Option<StreamView>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct VideoGalleryProps {
    pub local: Option<LocalTile>,
    pub remote: Vec<RemoteTile>,
    /// The remote participant whose screen share currently has focus.
    pub screen_share_participant: Option<String>,
    pub dominant_speakers: Vec<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonProps {
    pub checked: bool,
    pub disabled: bool,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplianceFlagsProps {
    pub recording: bool,
    pub transcription: bool,
}

/// A participant is screen sharing iff one of its streams is an
/// available screen share.
pub fn is_screen_sharing(participant: &Participant) -> bool {
    participant
        .video_streams
        .iter()
        .any(|s| s.kind == MediaStreamKind::ScreenShare && s.is_available)
}

fn first_stream(participant: &Participant, kind: MediaStreamKind) -> Option<&VideoStream> {
    participant.video_streams.iter().find(|s| s.kind == kind)
}

type Remotes = Arc<Vec<Participant>>;
type Speakers = Arc<Vec<String>>;
type Local = Arc<LocalParticipant>;

/// Memo caches for every call-surface selector.
#[derive(Default)]
pub struct CallSelectors {
    participant_list: Memo<
        (Option<(Remotes, bool, bool)>, String, String, Arc<RenderContext>),
        ParticipantListProps,
    >,
    video_gallery: Memo<
        (
            Option<(Local, Remotes, Speakers, bool, bool)>,
            String,
            String,
            Arc<RenderContext>,
        ),
        VideoGalleryProps,
    >,
    microphone: Memo<(Option<bool>, Arc<DeviceState>), ButtonProps>,
    camera: Memo<(Option<Local>, Arc<DeviceState>), ButtonProps>,
    screen_share: Memo<(Option<bool>,), ButtonProps>,
    end_call: Memo<(bool,), ButtonProps>,
    compliance: Memo<(Option<(bool, bool)>,), ComplianceFlagsProps>,
}

/// The call, unless there is none or it has ended.
pub fn active_call(state: &SessionState) -> Option<&Arc<CallState>> {
    state.call.as_ref().filter(|c| !c.ended)
}

impl CallSelectors {
    /// Select props for a call component.
    ///
    /// # Panics
    ///
    /// Panics if `id` names a chat component.
    pub fn select(
        &mut self,
        id: ComponentId,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
    ) -> ComponentProps {
        match id {
            ComponentId::ParticipantList => {
                ComponentProps::ParticipantList(self.participant_list(state, ctx))
            }
            ComponentId::VideoGallery => ComponentProps::VideoGallery(self.video_gallery(state, ctx)),
            ComponentId::MicrophoneButton => {
                ComponentProps::MicrophoneButton(self.microphone_button(state))
            }
            ComponentId::CameraButton => ComponentProps::CameraButton(self.camera_button(state)),
            ComponentId::ScreenShareButton => {
                ComponentProps::ScreenShareButton(self.screen_share_button(state))
            }
            ComponentId::EndCallButton => ComponentProps::EndCallButton(self.end_call_button(state)),
            ComponentId::ComplianceBanner => {
                ComponentProps::ComplianceBanner(self.compliance_flags(state))
            }
            other => panic!("{other} is not a call component"),
        }
    }

    pub fn participant_list(
        &mut self,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
    ) -> Arc<ParticipantListProps> {
        let deps = (
            active_call(state)
                .map(|c| (c.remote_participants.clone(), c.is_muted, c.is_screen_sharing_on)),
            flatten(&state.user),
            state.display_name.clone(),
            ctx.clone(),
        );
        self.participant_list
            .get(deps, |(call, user_id, display_name, ctx)| {
                let Some((remotes, is_muted, sharing)) = call else {
                    return ParticipantListProps::default();
                };
                let local = ParticipantItem {
                    user_id: user_id.clone(),
                    display_name: ctx.display_name(Some(display_name.as_str())).to_string(),
                    is_muted: *is_muted,
                    is_speaking: false,
                    is_screen_sharing: *sharing,
                };
                let remote = remotes.iter().map(|p| ParticipantItem {
                    user_id: flatten(&p.identifier),
                    display_name: ctx.display_name(p.display_name.as_deref()).to_string(),
                    is_muted: p.is_muted,
                    is_speaking: p.is_speaking,
                    is_screen_sharing: is_screen_sharing(p),
                });
                ParticipantListProps {
                    my_user_id: user_id.clone(),
                    participants: std::iter::once(local).chain(remote).collect(),
                }
            })
    }

    pub fn video_gallery(
        &mut self,
        state: &SessionState,
        ctx: &Arc<RenderContext>,
    ) -> Arc<VideoGalleryProps> {
        let deps = (
            active_call(state).map(|c| {
                (
                    c.local.clone(),
                    c.remote_participants.clone(),
                    c.dominant_speakers.clone(),
                    c.is_muted,
                    c.is_screen_sharing_on,
                )
            }),
            flatten(&state.user),
            state.display_name.clone(),
            ctx.clone(),
        );
        self.video_gallery
            .get(deps, |(call, user_id, display_name, ctx)| {
                let Some((local, remotes, speakers, is_muted, sharing)) = call else {
                    return VideoGalleryProps::default();
                };

                let camera = local
                    .video_streams
                    .iter()
                    .find(|s| s.kind == MediaStreamKind::Video);
                let local_tile = LocalTile {
                    user_id: user_id.clone(),
                    display_name: ctx.display_name(Some(display_name.as_str())).to_string(),
                    is_muted: *is_muted,
                    is_screen_sharing_on: *sharing,
                    video_available: camera.and_then(|s| s.render_target()).is_some(),
                    render_target: camera.and_then(|s| s.render_target()).cloned(),
                };

                let remote: Vec<RemoteTile> = remotes
                    .iter()
                    .map(|p| RemoteTile {
                        user_id: flatten(&p.identifier),
                        display_name: ctx.display_name(p.display_name.as_deref()).to_string(),
                        is_muted: p.is_muted,
                        is_speaking: p.is_speaking,
                        is_screen_sharing: is_screen_sharing(p),
                        video: first_stream(p, MediaStreamKind::Video).map(StreamView::from_stream),
                        screen_share: first_stream(p, MediaStreamKind::ScreenShare)
                            .map(StreamView::from_stream),
                    })
                    .collect();

                let screen_share_participant = remote
                    .iter()
                    .find(|t| t.is_screen_sharing)
                    .map(|t| t.user_id.clone());

                VideoGalleryProps {
                    local: Some(local_tile),
                    remote,
                    screen_share_participant,
                    dominant_speakers: speakers.to_vec(),
                }
            })
    }

    pub fn microphone_button(&mut self, state: &SessionState) -> Arc<ButtonProps> {
        let deps = (active_call(state).map(|c| c.is_muted), state.devices.clone());
        self.microphone.get(deps, |(muted, devices)| match muted {
            Some(muted) => ButtonProps {
                checked: !muted,
                disabled: devices.microphones.is_empty(),
            },
            None => ButtonProps {
                checked: false,
                disabled: true,
            },
        })
    }

    pub fn camera_button(&mut self, state: &SessionState) -> Arc<ButtonProps> {
        let deps = (active_call(state).map(|c| c.local.clone()), state.devices.clone());
        self.camera.get(deps, |(local, devices)| match local {
            Some(local) => ButtonProps {
                checked: local
                    .video_streams
                    .iter()
                    .any(|s| s.kind == MediaStreamKind::Video),
                disabled: devices.cameras.is_empty(),
            },
            None => ButtonProps {
                checked: false,
                disabled: true,
            },
        })
    }

    pub fn screen_share_button(&mut self, state: &SessionState) -> Arc<ButtonProps> {
        let deps = (active_call(state).map(|c| c.is_screen_sharing_on),);
        self.screen_share.get(deps, |(sharing,)| ButtonProps {
            checked: sharing.unwrap_or(false),
            disabled: sharing.is_none(),
        })
    }

    pub fn end_call_button(&mut self, state: &SessionState) -> Arc<ButtonProps> {
        let deps = (active_call(state).is_some(),);
        self.end_call.get(deps, |(in_call,)| ButtonProps {
            checked: false,
            disabled: !in_call,
        })
    }

    pub fn compliance_flags(&mut self, state: &SessionState) -> Arc<ComplianceFlagsProps> {
        let deps = (active_call(state).map(|c| (c.recording, c.transcription)),);
        self.compliance.get(deps, |(flags,)| {
            let (recording, transcription) = flags.unwrap_or((false, false));
            ComplianceFlagsProps {
                recording,
                transcription,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::Identifier;
    use crate::core::snapshot::LocalVideoStream;
    use crate::test_support::session_with_call;

    fn ctx() -> Arc<RenderContext> {
        Arc::new(RenderContext::default())
    }

    fn participant(id: &str, streams: Vec<VideoStream>) -> Participant {
        Participant {
            identifier: Identifier::communication_user(id),
            display_name: Some(id.to_uppercase()),
            is_muted: false,
            is_speaking: false,
            video_streams: streams,
        }
    }

    #[test]
    fn test_screen_share_requires_available_stream() {
        let idle = participant(
            "a",
            vec![VideoStream::new(1, MediaStreamKind::ScreenShare, false)],
        );
        let camera_only = participant("b", vec![VideoStream::new(2, MediaStreamKind::Video, true)]);
        let sharing = participant(
            "c",
            vec![
                VideoStream::new(3, MediaStreamKind::Video, false),
                VideoStream::new(4, MediaStreamKind::ScreenShare, true),
            ],
        );
        assert!(!is_screen_sharing(&idle));
        assert!(!is_screen_sharing(&camera_only));
        assert!(is_screen_sharing(&sharing));
    }

    #[test]
    fn test_no_call_yields_empty_props() {
        let state = SessionState::new(Identifier::communication_user("me"), "Me");
        let mut selectors = CallSelectors::default();
        assert!(selectors.participant_list(&state, &ctx()).participants.is_empty());
        assert_eq!(*selectors.video_gallery(&state, &ctx()), VideoGalleryProps::default());
        assert!(selectors.microphone_button(&state).disabled);
        assert!(selectors.end_call_button(&state).disabled);
        assert_eq!(
            *selectors.compliance_flags(&state),
            ComplianceFlagsProps::default()
        );
    }

    #[test]
    fn test_ended_call_counts_as_no_call() {
        let mut state = session_with_call(vec![]);
        let mut call = (**state.call.as_ref().unwrap()).clone();
        call.ended = true;
        state.call = Some(Arc::new(call));
        assert!(CallSelectors::default().end_call_button(&state).disabled);
    }

    #[test]
    fn test_local_tile_available_once_target_exists() {
        let mut state = session_with_call(vec![]);
        let mut call = (**state.call.as_ref().unwrap()).clone();
        call.local = Arc::new(LocalParticipant {
            video_streams: vec![LocalVideoStream::new("cam0", MediaStreamKind::Video)],
        });
        state.call = Some(Arc::new(call.clone()));

        let mut selectors = CallSelectors::default();
        let gallery = selectors.video_gallery(&state, &ctx());
        assert!(!gallery.local.as_ref().unwrap().video_available);

        call.local = Arc::new(LocalParticipant {
            video_streams: vec![
                LocalVideoStream::new("cam0", MediaStreamKind::Video).with_target(RenderTarget {
                    handle: "view-1".into(),
                    is_mirrored: true,
                }),
            ],
        });
        state.call = Some(Arc::new(call));
        let gallery = selectors.video_gallery(&state, &ctx());
        let local = gallery.local.as_ref().unwrap();
        assert!(local.video_available);
        assert_eq!(local.render_target.as_ref().unwrap().handle, "view-1");
    }

    #[test]
    fn test_gallery_picks_screen_share_participant() {
        let state = session_with_call(vec![
            participant("alice", vec![VideoStream::new(1, MediaStreamKind::Video, true)]),
            participant(
                "bob",
                vec![VideoStream::new(2, MediaStreamKind::ScreenShare, true)],
            ),
        ]);
        let gallery = CallSelectors::default().video_gallery(&state, &ctx());
        assert_eq!(gallery.screen_share_participant.as_deref(), Some("bob"));
        assert_eq!(gallery.remote.len(), 2);
        assert!(gallery.remote[0].video.as_ref().unwrap().is_available);
        assert!(gallery.remote[1].screen_share.is_some());
    }

    #[test]
    fn test_participant_list_stable_across_unrelated_changes() {
        let state = session_with_call(vec![participant("alice", vec![])]);
        let ctx = ctx();
        let mut selectors = CallSelectors::default();
        let a = selectors.participant_list(&state, &ctx);

        let mut call = (**state.call.as_ref().unwrap()).clone();
        call.recording = true;
        let mut next = state.clone();
        next.call = Some(Arc::new(call));
        let b = selectors.participant_list(&next, &ctx);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.participants.len(), 2);
        assert_eq!(b.participants[0].user_id, "me");
    }

    #[test]
    fn test_dispatch_by_component_id() {
        let state = session_with_call(vec![]);
        let mut selectors = CallSelectors::default();
        let props = selectors.select("EndCallButton".parse().unwrap(), &state, &ctx());
        assert!(matches!(props, ComponentProps::EndCallButton(p) if !p.disabled));
    }

    #[test]
    #[should_panic(expected = "MessageThread is not a call component")]
    fn test_chat_component_on_call_surface_panics() {
        let state = session_with_call(vec![]);
        CallSelectors::default().select(ComponentId::MessageThread, &state, &ctx());
    }
}
