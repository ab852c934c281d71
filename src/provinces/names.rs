//! Mapping between the official long-form province names used by boundary data
//! (e.g. "广东省") and the canonical short forms used everywhere else ("广东").

/// (long form, short form) for every provincial-level division.
pub const PROVINCE_NAMES: [(&str, &str); 34] = [
    ("北京市", "北京"),
    ("天津市", "天津"),
    ("上海市", "上海"),
    ("重庆市", "重庆"),
    ("河北省", "河北"),
    ("山西省", "山西"),
    ("辽宁省", "辽宁"),
    ("吉林省", "吉林"),
    ("黑龙江省", "黑龙江"),
    ("江苏省", "江苏"),
    ("浙江省", "浙江"),
    ("安徽省", "安徽"),
    ("福建省", "福建"),
    ("江西省", "江西"),
    ("山东省", "山东"),
    ("河南省", "河南"),
    ("湖北省", "湖北"),
    ("湖南省", "湖南"),
    ("广东省", "广东"),
    ("海南省", "海南"),
    ("四川省", "四川"),
    ("贵州省", "贵州"),
    ("云南省", "云南"),
    ("陕西省", "陕西"),
    ("甘肃省", "甘肃"),
    ("青海省", "青海"),
    ("台湾省", "台湾"),
    ("内蒙古自治区", "内蒙古"),
    ("广西壮族自治区", "广西"),
    ("西藏自治区", "西藏"),
    ("宁夏回族自治区", "宁夏"),
    ("新疆维吾尔自治区", "新疆"),
    ("香港特别行政区", "香港"),
    ("澳门特别行政区", "澳门"),
];

/// Long form to short form. Names not in the table are returned unchanged.
pub fn to_short_name(name: &str) -> &str {
    PROVINCE_NAMES
        .iter()
        .find(|(long, _)| *long == name)
        .map_or(name, |(_, short)| *short)
}

/// Short form to long form. Names not in the table are returned unchanged.
pub fn to_long_name(name: &str) -> &str {
    PROVINCE_NAMES
        .iter()
        .find(|(_, short)| *short == name)
        .map_or(name, |(long, _)| *long)
}
