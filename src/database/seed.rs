use tracing::info;

use crate::database::PointStore;
use crate::error::AppResult;
use crate::models::NewPoint;

/// Built-in demo data: central Chengdu plus a few distant points.
pub fn sample_points() -> Vec<NewPoint> {
    vec![
        NewPoint::new("天府广场", "hot", 104.066801, 30.657401)
            .with_description("成都市中心的标志性广场")
            .with_likes(610),
        NewPoint::new("宽窄巷子", "hot", 104.059086, 30.671754)
            .with_description("成都著名的历史文化街区")
            .with_author("王五")
            .with_likes(450),
        NewPoint::new("春熙路", "hot", 104.082855, 30.655822)
            .with_description("成都最繁华的商业步行街")
            .with_likes(390),
        NewPoint::new("锦里古街", "exhibition", 104.040120, 30.642766)
            .with_description("成都著名的商业步行街，三国文化浓厚")
            .with_author("张三")
            .with_likes(520),
        NewPoint::new("杜甫草堂", "exhibition", 104.026392, 30.667458)
            .with_description("唐代大诗人杜甫的故居")
            .with_likes(275),
        NewPoint::new("成都环球中心", "exhibition", 104.0668, 30.5684)
            .with_description("世界最大单体建筑之一")
            .with_author("李四")
            .with_likes(380),
        NewPoint::new("迷人的风景", "hot", 105.17603045237513, 27.704558102951587)
            .with_description("这是一个美丽的风景区，值得一游")
            .with_author("倪瑜")
            .with_likes(273),
        NewPoint::new("独特的建筑", "exhibition", 110.54895699237717, 18.0)
            .with_description("这里有一个独特的建筑展览")
            .with_author("周玉英")
            .with_likes(141),
        NewPoint::new("美丽的乡村", "personal", 119.57661073248477, 21.855971958351077)
            .with_description("这是一个美丽的乡村点")
            .with_author("严海燕")
            .with_likes(381),
    ]
}

/// Replaces the whole collection with `points` when `clear` is set,
/// otherwise appends. Returns the number inserted.
pub fn seed_points(store: &dyn PointStore, points: &[NewPoint], clear: bool) -> AppResult<usize> {
    if clear {
        let removed = store.clear()?;
        info!("Cleared {} existing points", removed);
    }

    let inserted = store.insert_many(points)?;
    info!("Seeded {} points", inserted);
    Ok(inserted)
}
