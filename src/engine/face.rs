use cgmath::Vector3;
use strum_macros::EnumIter;

// Z is up. Front faces -y, back faces +y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum FaceDirection {
    Top,
    Bottom,
    Front,
    Back,
    Left,
    Right,
}

impl FaceDirection {
    pub const fn as_dir(&self) -> Vector3<i32> {
        match self {
            FaceDirection::Top => Vector3::new(0, 0, 1),
            FaceDirection::Bottom => Vector3::new(0, 0, -1),
            FaceDirection::Front => Vector3::new(0, -1, 0),
            FaceDirection::Back => Vector3::new(0, 1, 0),
            FaceDirection::Left => Vector3::new(-1, 0, 0),
            FaceDirection::Right => Vector3::new(1, 0, 0),
        }
    }

    /// Faces lit by the column test. The remaining faces always sit in shade.
    pub const fn faces_sun(&self) -> bool {
        matches!(self, FaceDirection::Top | FaceDirection::Front | FaceDirection::Right)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter)]
pub enum SideDirection {
    Top,
    Bottom,
    Side,
}

impl From<FaceDirection> for SideDirection {
    fn from(val: FaceDirection) -> Self {
        match val {
            FaceDirection::Top => SideDirection::Top,
            FaceDirection::Bottom => SideDirection::Bottom,
            FaceDirection::Front | FaceDirection::Back | FaceDirection::Left | FaceDirection::Right => {
                SideDirection::Side
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_face_points_along_one_axis() {
        let dirs: Vec<_> = FaceDirection::iter().map(|face| face.as_dir()).collect();

        for dir in &dirs {
            assert_eq!(dir.x.abs() + dir.y.abs() + dir.z.abs(), 1);
        }
        assert_eq!(dirs.iter().fold(Vector3::new(0, 0, 0), |acc, dir| acc + *dir), Vector3::new(0, 0, 0));
        assert_eq!(FaceDirection::Front.as_dir(), Vector3::new(0, -1, 0));
    }

    #[test]
    fn only_top_front_right_face_the_sun() {
        let sunward: Vec<_> = FaceDirection::iter().filter(FaceDirection::faces_sun).collect();
        assert_eq!(sunward, vec![FaceDirection::Top, FaceDirection::Front, FaceDirection::Right]);
    }
}
